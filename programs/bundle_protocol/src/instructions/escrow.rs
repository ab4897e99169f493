use anchor_lang::prelude::*;
use anchor_spl::token::{self, Transfer};

use crate::constants::*;
use crate::errors::BundleError;
use crate::{DepositEscrow, InitUserEscrow, WithdrawEscrow};

/// Sets up the per-(bundle, user) escrow used by sponsored opens. The vault
/// holds the user's bundle tokens under the escrow PDA's authority so a
/// relayer-submitted open can lock one without the user's wallet on-line.
pub fn init_user_escrow(ctx: Context<InitUserEscrow>, bundle_id: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let escrow = &mut ctx.accounts.user_escrow;
    escrow.user = ctx.accounts.user.key();
    escrow.bundle_id = bundle_id;
    escrow.bump = ctx.bumps.user_escrow;

    escrow.vault = ctx.accounts.user_escrow_vault.key();
    escrow.vault_bump = ctx.bumps.user_escrow_vault;

    escrow.open_count = 0;
    escrow.created_ts = now;
    escrow.updated_ts = now;

    Ok(())
}

pub fn deposit_escrow(ctx: Context<DepositEscrow>, _bundle_id: u64, amount: u64) -> Result<()> {
    require!(amount > 0, BundleError::InvalidAmount);

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.user_bundle_ata.to_account_info(),
                to: ctx.accounts.user_escrow_vault.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        amount,
    )?;

    ctx.accounts.user_escrow.updated_ts = Clock::get()?.unix_timestamp;

    Ok(())
}

pub fn withdraw_escrow(ctx: Context<WithdrawEscrow>, bundle_id: u64, amount: u64) -> Result<()> {
    require!(amount > 0, BundleError::InvalidAmount);
    require!(
        ctx.accounts.user_escrow_vault.amount >= amount,
        BundleError::InsufficientEscrow
    );

    let user_pk = ctx.accounts.user.key();
    let bundle_le = bundle_id.to_le_bytes();
    let escrow_bump = ctx.accounts.user_escrow.bump;
    let escrow_signer: &[&[&[u8]]] = &[&[
        USER_ESCROW_SEED,
        &bundle_le,
        user_pk.as_ref(),
        &[escrow_bump],
    ]];

    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.user_escrow_vault.to_account_info(),
                to: ctx.accounts.user_bundle_ata.to_account_info(),
                authority: ctx.accounts.user_escrow.to_account_info(),
            },
            escrow_signer,
        ),
        amount,
    )?;

    ctx.accounts.user_escrow.updated_ts = Clock::get()?.unix_timestamp;

    Ok(())
}
