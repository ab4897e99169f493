use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    program::{invoke, invoke_signed},
    system_instruction,
};

use crate::constants::*;
use crate::errors::BundleError;
use crate::events::OracleReserveFunded;
use crate::state::Config;
use crate::{
    FundOracleReserve, InitializeBundleRegistry, InitializeConfig, SetOracleConfig, SetPause,
    WithdrawOracleReserve,
};

pub fn initialize_config(ctx: Context<InitializeConfig>, oracle_fee_lamports: u64) -> Result<()> {
    require!(oracle_fee_lamports > 0, BundleError::InvalidOracleFee);

    let cfg: &mut Account<Config> = &mut ctx.accounts.config;

    cfg.admin = ctx.accounts.admin.key();
    cfg.bump = ctx.bumps.config;

    cfg.fee_vault = ctx.accounts.fee_vault.key();
    cfg.fee_vault_bump = ctx.bumps.fee_vault;

    // Oracle identity and fee destination are wired up separately via
    // set_oracle_config; opens are rejected until then.
    cfg.oracle_pubkey = Pubkey::default();
    cfg.oracle_fee_lamports = oracle_fee_lamports;
    cfg.oracle_fee_collector = ctx.accounts.admin.key();

    cfg.next_request_nonce = 0;
    cfg.paused = false;
    cfg.version = INITIAL_VERSION;

    Ok(())
}

pub fn set_pause(ctx: Context<SetPause>, paused: bool) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), BundleError::Unauthorized);
    cfg.paused = paused;
    Ok(())
}

pub fn set_oracle_config(
    ctx: Context<SetOracleConfig>,
    oracle_pubkey: Pubkey,
    oracle_fee_lamports: u64,
    oracle_fee_collector: Pubkey,
) -> Result<()> {
    require!(oracle_fee_lamports > 0, BundleError::InvalidOracleFee);

    let cfg = &mut ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), BundleError::Unauthorized);

    cfg.oracle_pubkey = oracle_pubkey;
    cfg.oracle_fee_lamports = oracle_fee_lamports;
    cfg.oracle_fee_collector = oracle_fee_collector;

    Ok(())
}

/// Anyone may top up the reserve that pays the per-request oracle fee.
pub fn fund_oracle_reserve(ctx: Context<FundOracleReserve>, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let ix = system_instruction::transfer(
        &ctx.accounts.funder.key(),
        &ctx.accounts.fee_vault.key(),
        amount,
    );

    invoke(
        &ix,
        &[
            ctx.accounts.funder.to_account_info(),
            ctx.accounts.fee_vault.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
    )?;

    emit!(OracleReserveFunded {
        funder: ctx.accounts.funder.key(),
        amount,
        reserve_balance: ctx.accounts.fee_vault.lamports(),
    });

    Ok(())
}

/// Admin drains the reserve, keeping the rent floor. `amount == 0` withdraws
/// everything above the floor.
pub fn withdraw_oracle_reserve(ctx: Context<WithdrawOracleReserve>, amount: u64) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), BundleError::Unauthorized);

    let vault_info = ctx.accounts.fee_vault.to_account_info();

    let rent = Rent::get()?;
    let min_rent = rent.minimum_balance(0);
    let current_lamports = vault_info.lamports();

    let withdraw_amount = if amount == 0 {
        current_lamports.saturating_sub(min_rent)
    } else {
        amount
    };

    if withdraw_amount == 0 {
        return Ok(());
    }

    require!(
        current_lamports >= withdraw_amount.saturating_add(min_rent),
        BundleError::InsufficientReserve
    );

    let ix = system_instruction::transfer(
        &ctx.accounts.fee_vault.key(),
        &ctx.accounts.admin.key(),
        withdraw_amount,
    );

    invoke_signed(
        &ix,
        &[
            ctx.accounts.fee_vault.to_account_info(),
            ctx.accounts.admin.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
        &[&[FEE_VAULT_SEED, &[cfg.fee_vault_bump]]],
    )?;

    Ok(())
}

pub fn initialize_bundle_registry(
    ctx: Context<InitializeBundleRegistry>,
    start_bundle_id: u64,
) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), BundleError::Unauthorized);

    let registry = &mut ctx.accounts.bundle_registry;
    registry.admin = cfg.admin;
    registry.bump = ctx.bumps.bundle_registry;
    registry.next_bundle_id = start_bundle_id;
    registry.version = INITIAL_VERSION;

    Ok(())
}
