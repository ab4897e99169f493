use anchor_lang::prelude::*;

#[event]
pub struct BundleCreated {
    pub bundle_id: u64,
    pub creator: Pubkey,
    pub bundle_mint: Pubkey,
    pub circulating_supply: u64,
    pub rewards_per_open: u64,
    pub reward_kinds: u64,
}

#[event]
pub struct OpenRequested {
    pub bundle_id: u64,
    pub opener: Pubkey,
    pub request_id: [u8; 32],
    pub fee_paid: u64,
}

#[event]
pub struct OpenFulfilled {
    pub bundle_id: u64,
    pub opener: Pubkey,
    pub request_id: [u8; 32],
    pub rewards_drawn: u64,
}

#[event]
pub struct OracleReserveFunded {
    pub funder: Pubkey,
    pub amount: u64,
    pub reserve_balance: u64,
}
