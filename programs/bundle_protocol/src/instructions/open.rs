use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};
use anchor_lang::solana_program::{program::invoke_signed, system_instruction};
use anchor_spl::token::{self, Transfer};

use crate::constants::*;
use crate::errors::BundleError;
use crate::events::OpenRequested;
use crate::utils::{
    assert_ed25519_ix_matches, begin_open, charge_oracle_fee, derive_request_id,
    expected_open_msg, validate_open_eligibility,
};
use crate::{OpenBundle, OpenBundleSigned};

/// Pays the randomness fee from the reserve. The reserve is a system-owned
/// PDA, so the transfer is a system instruction signed with its seeds.
fn pay_oracle_fee<'info>(
    fee_vault: &AccountInfo<'info>,
    collector: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    fee: u64,
    vault_bump: u8,
) -> Result<()> {
    let ix = system_instruction::transfer(fee_vault.key, collector.key, fee);

    invoke_signed(
        &ix,
        &[fee_vault.clone(), collector.clone(), system_program.clone()],
        &[&[FEE_VAULT_SEED, &[vault_bump]]],
    )?;

    Ok(())
}

/// Locks the (bundle, opener) slot, pays the oracle fee from the reserve, and
/// escrows one bundle token. The drawn rewards arrive later, via the oracle's
/// fulfill_open callback; this instruction only emits the request.
pub fn open_bundle(ctx: Context<OpenBundle>, bundle_id: u64) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require!(!cfg.paused, BundleError::Paused);
    require!(cfg.oracle_pubkey != Pubkey::default(), BundleError::OracleNotSet);

    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    validate_open_eligibility(
        &ctx.accounts.bundle,
        ctx.accounts.opener_bundle_ata.amount,
        now,
    )?;

    // All failure paths precede the first effect: a rejected open leaves no
    // pending request, no fee movement, no escrowed token.
    let fee = cfg.oracle_fee_lamports;
    let rent_floor = Rent::get()?.minimum_balance(0);
    charge_oracle_fee(ctx.accounts.fee_vault.lamports(), rent_floor, fee)?;

    let opener_pk = ctx.accounts.opener.key();
    let nonce = cfg.next_request_nonce;
    let fee_vault_bump = cfg.fee_vault_bump;
    let request_id = derive_request_id(bundle_id, &opener_pk, nonce, clock.slot);

    {
        let request = &mut ctx.accounts.open_request;
        begin_open(request, bundle_id, opener_pk, request_id, now)?;
        request.bump = ctx.bumps.open_request;
    }

    pay_oracle_fee(
        &ctx.accounts.fee_vault.to_account_info(),
        &ctx.accounts.oracle_fee_collector.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        fee,
        fee_vault_bump,
    )?;

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.opener_bundle_ata.to_account_info(),
                to: ctx.accounts.bundle_escrow.to_account_info(),
                authority: ctx.accounts.opener.to_account_info(),
            },
        ),
        1,
    )?;

    let cfg = &mut ctx.accounts.config;
    cfg.next_request_nonce = cfg
        .next_request_nonce
        .checked_add(1)
        .ok_or_else(|| error!(BundleError::MathOverflow))?;

    emit!(OpenRequested {
        bundle_id,
        opener: opener_pk,
        request_id,
        fee_paid: fee,
    });

    Ok(())
}

/// Sponsored open: a relayer pays for the transaction, the opener authorizes
/// it with an ed25519 signature over the canonical open message, and the
/// locked bundle token comes from the opener's escrow. The opener, not the
/// relayer, is the effective caller for every check and all tracker state.
///
/// Tx layout must be: [ ed25519_verify, open_bundle_signed ]
pub fn open_bundle_signed(
    ctx: Context<OpenBundleSigned>,
    bundle_id: u64,
    opener: Pubkey,
    intent_nonce: u64,
) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require!(!cfg.paused, BundleError::Paused);
    require!(cfg.oracle_pubkey != Pubkey::default(), BundleError::OracleNotSet);

    // --- ed25519 introspection: the opener signed this exact intent ---
    let ix_sys = ctx.accounts.instructions.to_account_info();
    let current_ix = load_current_index_checked(&ix_sys)? as usize;
    require!(current_ix >= 1, BundleError::MissingOrInvalidEd25519Ix);

    let ed_ix = load_instruction_at_checked(current_ix - 1, &ix_sys)
        .map_err(|_| error!(BundleError::MissingOrInvalidEd25519Ix))?;

    let expected = expected_open_msg(ctx.program_id, bundle_id, &opener, intent_nonce);
    assert_ed25519_ix_matches(&ed_ix, &opener, expected.as_slice())?;

    // monotonic intent nonce: a captured signature cannot be replayed
    require!(
        intent_nonce == ctx.accounts.user_escrow.open_count,
        BundleError::IntentNonceMismatch
    );

    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    // eligibility against the opener's escrowed balance
    validate_open_eligibility(
        &ctx.accounts.bundle,
        ctx.accounts.user_escrow_vault.amount,
        now,
    )?;

    let fee = cfg.oracle_fee_lamports;
    let rent_floor = Rent::get()?.minimum_balance(0);
    charge_oracle_fee(ctx.accounts.fee_vault.lamports(), rent_floor, fee)?;

    let nonce = cfg.next_request_nonce;
    let fee_vault_bump = cfg.fee_vault_bump;
    let request_id = derive_request_id(bundle_id, &opener, nonce, clock.slot);

    {
        let request = &mut ctx.accounts.open_request;
        begin_open(request, bundle_id, opener, request_id, now)?;
        request.bump = ctx.bumps.open_request;
    }

    pay_oracle_fee(
        &ctx.accounts.fee_vault.to_account_info(),
        &ctx.accounts.oracle_fee_collector.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        fee,
        fee_vault_bump,
    )?;

    let bundle_le = bundle_id.to_le_bytes();
    let escrow_bump = ctx.accounts.user_escrow.bump;
    let escrow_signer: &[&[&[u8]]] = &[&[
        USER_ESCROW_SEED,
        &bundle_le,
        opener.as_ref(),
        &[escrow_bump],
    ]];

    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.user_escrow_vault.to_account_info(),
                to: ctx.accounts.bundle_escrow.to_account_info(),
                authority: ctx.accounts.user_escrow.to_account_info(),
            },
            escrow_signer,
        ),
        1,
    )?;

    let escrow = &mut ctx.accounts.user_escrow;
    escrow.open_count = escrow
        .open_count
        .checked_add(1)
        .ok_or_else(|| error!(BundleError::MathOverflow))?;
    escrow.updated_ts = now;

    let cfg = &mut ctx.accounts.config;
    cfg.next_request_nonce = cfg
        .next_request_nonce
        .checked_add(1)
        .ok_or_else(|| error!(BundleError::MathOverflow))?;

    emit!(OpenRequested {
        bundle_id,
        opener,
        request_id,
        fee_paid: fee,
    });

    Ok(())
}

#[cfg(test)]
mod slot_tests {
    use crate::errors::BundleError;
    use crate::state::RequestStatus;
    use crate::utils::test_support::*;
    use crate::utils::{begin_open, derive_request_id, resolve_request};
    use anchor_lang::prelude::Pubkey;

    #[test]
    fn slot_cycles_idle_pending_idle() {
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();

        let id = derive_request_id(5, &opener, 0, 1_000);
        begin_open(&mut req, 5, opener, id, 100).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);

        resolve_request(&mut req, 5, &opener, &id, 150).unwrap();
        assert_eq!(req.status, RequestStatus::Resolved);

        let id2 = derive_request_id(5, &opener, 1, 1_200);
        begin_open(&mut req, 5, opener, id2, 200).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
    }

    /// A request the oracle never fulfills keeps its (bundle, opener) slot
    /// locked forever. There is deliberately no timeout or cancellation
    /// instruction; only a fulfillment can free the slot.
    #[test]
    fn unfulfilled_request_keeps_slot_locked() {
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();

        let id = derive_request_id(5, &opener, 0, 1_000);
        begin_open(&mut req, 5, opener, id, 100).unwrap();

        // arbitrarily far in the future the slot is still locked
        for later in [101i64, 10_000, i64::MAX] {
            assert_err(
                begin_open(&mut req, 5, opener, [0u8; 32], later),
                BundleError::OpenAlreadyPending,
            );
        }
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.request_id, id);
    }
}
