use anchor_lang::prelude::*;

use crate::constants::MAX_REWARD_KINDS;

#[account]
#[derive(InitSpace)]
pub struct Config {
    pub admin: Pubkey,
    pub bump: u8,

    /// Oracle pubkey allowed to fulfill open requests via ed25519 introspection.
    pub oracle_pubkey: Pubkey,

    /// Fee in lamports paid from the reserve for each randomness request.
    pub oracle_fee_lamports: u64,

    /// Destination of the per-request fee.
    pub oracle_fee_collector: Pubkey,

    /// System-owned PDA holding the pre-funded oracle fee reserve.
    pub fee_vault: Pubkey,
    pub fee_vault_bump: u8,

    /// Config-wide nonce folded into every request id.
    pub next_request_nonce: u64,

    pub paused: bool,
    pub version: u16,
}

#[account]
#[derive(InitSpace)]
pub struct BundleRegistry {
    pub admin: Pubkey,
    pub bump: u8,
    pub next_bundle_id: u64,
    pub version: u16,
}

/// One reward kind inside a bundle's pool: the token mint and how many
/// undrawn units of it remain in custody.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct RewardRecord {
    pub mint: Pubkey,
    pub remaining: u64,
}

#[account]
#[derive(InitSpace)]
pub struct Bundle {
    pub bundle_id: u64,
    pub bump: u8,

    pub creator: Pubkey,

    /// SPL mint of the bundle token (0 decimals, authority = bundle PDA).
    pub bundle_mint: Pubkey,
    pub bundle_mint_bump: u8,

    /// Token account holding bundle tokens locked by in-flight opens.
    pub escrow: Pubkey,
    pub escrow_bump: u8,

    /// Open window [start, end) as unix timestamps. end == 0 means no expiry.
    pub open_start_ts: i64,
    pub open_end_ts: i64,

    /// Reward units handed out per opened bundle token.
    pub rewards_per_open: u64,

    /// Bundle tokens still redeemable (decremented on each fulfilled open).
    pub circulating_supply: u64,

    pub created_ts: i64,

    /// Append-only reward pool; only `remaining` counters ever change.
    #[max_len(MAX_REWARD_KINDS)]
    pub rewards: Vec<RewardRecord>,
}

/// Lifecycle of a (bundle, opener) slot. Idle marks a never-used slot,
/// Pending an in-flight randomness request, Resolved a fulfilled one. A
/// Resolved slot may be reused by a later open or closed for rent.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Default, Debug,
)]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Resolved,
}

/// Ephemeral record of one in-flight open. At most one exists per
/// (bundle, opener) pair: the PDA address is derived from that pair and the
/// status guard rejects a second open while one is pending.
#[account]
#[derive(InitSpace)]
pub struct OpenRequest {
    pub bundle_id: u64,
    pub opener: Pubkey,
    pub bump: u8,

    /// Opaque request identifier echoed back by the oracle.
    pub request_id: [u8; 32],

    pub status: RequestStatus,

    pub created_ts: i64,
    pub resolved_ts: i64,
}

/// Per-(bundle, user) escrow of bundle tokens, funding sponsored opens where a
/// relayer pays for the transaction but the user remains the effective opener.
#[account]
#[derive(InitSpace)]
pub struct UserEscrow {
    pub user: Pubkey,
    pub bundle_id: u64,
    pub bump: u8,

    pub vault: Pubkey,
    pub vault_bump: u8,

    /// Monotonic counter; each signed open intent must carry the current value.
    pub open_count: u64,

    pub created_ts: i64,
    pub updated_ts: i64,
}
