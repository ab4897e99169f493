use anchor_lang::prelude::*;

pub mod constants;
pub mod contexts;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;
pub mod utils;

pub use constants::*;
pub use contexts::*;
pub use errors::*;
pub use events::*;
pub use instructions::*;
pub use state::*;
pub use utils::*;

use solana_security_txt::security_txt;

security_txt! {
    // Required fields
    name: "Bundle Protocol",
    project_url: "https://bundleprotocol.xyz",
    contacts: "email:security@bundleprotocol.xyz,link:https://github.com/bundle-protocol/bundle-protocol/issues",
    policy: "https://github.com/bundle-protocol/bundle-protocol/blob/main/SECURITY.md",

    // Optional fields
    preferred_languages: "en",
    source_code: "https://github.com/bundle-protocol/bundle-protocol"
}

declare_id!("GeA3JqAjAWBCoW3JVDbdjTEoxfUaSgtHuxiAeGG5PrUP");

#[program]
pub mod bundle_protocol {
    use super::*;
    use crate::instructions::{admin, bundle, escrow, fulfill, lifecycle, open};

    // ----------------------------
    // Config and oracle admin
    // ----------------------------
    pub fn initialize_config(
        ctx: Context<InitializeConfig>,
        oracle_fee_lamports: u64,
    ) -> Result<()> {
        admin::initialize_config(ctx, oracle_fee_lamports)
    }

    pub fn set_pause(ctx: Context<SetPause>, paused: bool) -> Result<()> {
        admin::set_pause(ctx, paused)
    }

    pub fn set_oracle_config(
        ctx: Context<SetOracleConfig>,
        oracle_pubkey: Pubkey,
        oracle_fee_lamports: u64,
        oracle_fee_collector: Pubkey,
    ) -> Result<()> {
        admin::set_oracle_config(ctx, oracle_pubkey, oracle_fee_lamports, oracle_fee_collector)
    }

    pub fn fund_oracle_reserve(ctx: Context<FundOracleReserve>, amount: u64) -> Result<()> {
        admin::fund_oracle_reserve(ctx, amount)
    }

    pub fn withdraw_oracle_reserve(ctx: Context<WithdrawOracleReserve>, amount: u64) -> Result<()> {
        admin::withdraw_oracle_reserve(ctx, amount)
    }

    pub fn initialize_bundle_registry(
        ctx: Context<InitializeBundleRegistry>,
        start_bundle_id: u64,
    ) -> Result<()> {
        admin::initialize_bundle_registry(ctx, start_bundle_id)
    }

    // ----------------------------
    // Bundle creation
    // ----------------------------
    pub fn create_bundle<'info>(
        ctx: Context<'_, '_, 'info, 'info, CreateBundle<'info>>,
        window_start: i64,
        window_end: i64,
        rewards_per_open: u64,
        amounts: Vec<u64>,
    ) -> Result<()> {
        bundle::create_bundle(ctx, window_start, window_end, rewards_per_open, amounts)
    }

    // ----------------------------
    // Open and fulfill
    // ----------------------------
    pub fn open_bundle(ctx: Context<OpenBundle>, bundle_id: u64) -> Result<()> {
        open::open_bundle(ctx, bundle_id)
    }

    pub fn open_bundle_signed(
        ctx: Context<OpenBundleSigned>,
        bundle_id: u64,
        opener: Pubkey,
        intent_nonce: u64,
    ) -> Result<()> {
        open::open_bundle_signed(ctx, bundle_id, opener, intent_nonce)
    }

    pub fn fulfill_open<'info>(
        ctx: Context<'_, '_, 'info, 'info, FulfillOpen<'info>>,
        bundle_id: u64,
        opener: Pubkey,
        request_id: [u8; 32],
        random_value: [u8; 32],
    ) -> Result<()> {
        fulfill::fulfill_open(ctx, bundle_id, opener, request_id, random_value)
    }

    pub fn close_open_request(ctx: Context<CloseOpenRequest>, bundle_id: u64) -> Result<()> {
        lifecycle::close_open_request(ctx, bundle_id)
    }

    // ----------------------------
    // Sponsored-open escrow
    // ----------------------------
    pub fn init_user_escrow(ctx: Context<InitUserEscrow>, bundle_id: u64) -> Result<()> {
        escrow::init_user_escrow(ctx, bundle_id)
    }

    pub fn deposit_escrow(ctx: Context<DepositEscrow>, bundle_id: u64, amount: u64) -> Result<()> {
        escrow::deposit_escrow(ctx, bundle_id, amount)
    }

    pub fn withdraw_escrow(ctx: Context<WithdrawEscrow>, bundle_id: u64, amount: u64) -> Result<()> {
        escrow::withdraw_escrow(ctx, bundle_id, amount)
    }
}
