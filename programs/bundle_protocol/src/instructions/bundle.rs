use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_pack::Pack;
use anchor_lang::solana_program::{program::invoke_signed, system_instruction};
use anchor_spl::token::{self, spl_token, InitializeAccount3, Mint, MintTo, TokenAccount, Transfer};

use crate::constants::*;
use crate::errors::BundleError;
use crate::events::BundleCreated;
use crate::state::RewardRecord;
use crate::utils::validate_bundle_params;
use crate::CreateBundle;

/// Deposits a pool of reward tokens and mints the bundle tokens redeemable
/// against it. Remaining accounts carry one [reward_mint, creator_source,
/// reward_vault] triple per reward kind; the vaults are created here as PDA
/// token accounts owned by the bundle.
pub fn create_bundle<'info>(
    ctx: Context<'_, '_, 'info, 'info, CreateBundle<'info>>,
    window_start: i64,
    window_end: i64,
    rewards_per_open: u64,
    amounts: Vec<u64>,
) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require!(!cfg.paused, BundleError::Paused);

    let kinds = amounts.len();
    require!(kinds > 0, BundleError::EmptyDeposit);
    require!(kinds <= MAX_REWARD_KINDS, BundleError::TooManyRewardKinds);
    require!(
        ctx.remaining_accounts.len() == kinds * 3,
        BundleError::RewardAccountMismatch
    );

    let total_units = amounts
        .iter()
        .try_fold(0u64, |acc, &a| acc.checked_add(a))
        .ok_or_else(|| error!(BundleError::MathOverflow))?;
    for &a in amounts.iter() {
        require!(a > 0, BundleError::InvalidAmount);
    }

    let bundles_mintable =
        validate_bundle_params(window_start, window_end, rewards_per_open, total_units)?;

    let bundle_id = ctx.accounts.bundle_registry.next_bundle_id;
    let bundle_le = bundle_id.to_le_bytes();
    let creator_pk = ctx.accounts.creator.key();
    let now = Clock::get()?.unix_timestamp;

    // --- reward vaults: create, initialize, deposit ---
    let vault_space = spl_token::state::Account::LEN;
    let vault_lamports = Rent::get()?.minimum_balance(vault_space);

    let mut records: Vec<RewardRecord> = Vec::with_capacity(kinds);
    for (i, &amount) in amounts.iter().enumerate() {
        let mint_ai = &ctx.remaining_accounts[i * 3];
        let source_ai = &ctx.remaining_accounts[i * 3 + 1];
        let vault_ai = &ctx.remaining_accounts[i * 3 + 2];

        // must be a real SPL mint
        Account::<Mint>::try_from(mint_ai)?;
        let mint_pk = *mint_ai.key;

        require!(
            records.iter().all(|r| r.mint != mint_pk),
            BundleError::DuplicateRewardMint
        );

        let (expected_vault, vault_bump) = Pubkey::find_program_address(
            &[REWARD_VAULT_SEED, &bundle_le, mint_pk.as_ref()],
            ctx.program_id,
        );
        require_keys_eq!(expected_vault, *vault_ai.key, BundleError::RewardAccountMismatch);
        require!(
            vault_ai.lamports() == 0 && vault_ai.data_is_empty(),
            BundleError::RewardAccountMismatch
        );

        let ix = system_instruction::create_account(
            &creator_pk,
            vault_ai.key,
            vault_lamports,
            vault_space as u64,
            ctx.accounts.token_program.key,
        );

        let vault_signer: &[&[&[u8]]] = &[&[
            REWARD_VAULT_SEED,
            &bundle_le,
            mint_pk.as_ref(),
            &[vault_bump],
        ]];

        invoke_signed(
            &ix,
            &[
                ctx.accounts.creator.to_account_info(),
                vault_ai.clone(),
                ctx.accounts.system_program.to_account_info(),
            ],
            vault_signer,
        )?;

        token::initialize_account3(CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            InitializeAccount3 {
                account: vault_ai.clone(),
                mint: mint_ai.clone(),
                authority: ctx.accounts.bundle.to_account_info(),
            },
        ))?;

        let source = Account::<TokenAccount>::try_from(source_ai)?;
        require_keys_eq!(source.mint, mint_pk, BundleError::RewardAccountMismatch);
        require_keys_eq!(source.owner, creator_pk, BundleError::Unauthorized);

        token::transfer(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: source_ai.clone(),
                    to: vault_ai.clone(),
                    authority: ctx.accounts.creator.to_account_info(),
                },
            ),
            amount,
        )?;

        records.push(RewardRecord {
            mint: mint_pk,
            remaining: amount,
        });
    }

    // --- mint the bundle tokens (one per rewards_per_open-sized group) ---
    let bundle_bump = ctx.bumps.bundle;
    let bundle_signer: &[&[&[u8]]] = &[&[BUNDLE_SEED, &bundle_le, &[bundle_bump]]];

    token::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.bundle_mint.to_account_info(),
                to: ctx.accounts.creator_holding.to_account_info(),
                authority: ctx.accounts.bundle.to_account_info(),
            },
            bundle_signer,
        ),
        bundles_mintable,
    )?;

    // --- persist ---
    let bundle = &mut ctx.accounts.bundle;
    bundle.bundle_id = bundle_id;
    bundle.bump = bundle_bump;
    bundle.creator = creator_pk;

    bundle.bundle_mint = ctx.accounts.bundle_mint.key();
    bundle.bundle_mint_bump = ctx.bumps.bundle_mint;

    bundle.escrow = ctx.accounts.bundle_escrow.key();
    bundle.escrow_bump = ctx.bumps.bundle_escrow;

    bundle.open_start_ts = window_start;
    bundle.open_end_ts = window_end;
    bundle.rewards_per_open = rewards_per_open;
    bundle.circulating_supply = bundles_mintable;
    bundle.created_ts = now;
    bundle.rewards = records;

    let registry = &mut ctx.accounts.bundle_registry;
    registry.next_bundle_id = registry
        .next_bundle_id
        .checked_add(1)
        .ok_or_else(|| error!(BundleError::MathOverflow))?;

    emit!(BundleCreated {
        bundle_id,
        creator: creator_pk,
        bundle_mint: ctx.accounts.bundle_mint.key(),
        circulating_supply: bundles_mintable,
        rewards_per_open,
        reward_kinds: kinds as u64,
    });

    Ok(())
}

#[cfg(test)]
mod vault_layout_tests {
    use anchor_lang::solana_program::program_pack::Pack;
    use anchor_spl::token::spl_token;

    #[test]
    fn reward_vault_space_matches_spl_account_layout() {
        // create_bundle sizes each reward vault from this constant
        assert_eq!(spl_token::state::Account::LEN, 165);
    }
}
