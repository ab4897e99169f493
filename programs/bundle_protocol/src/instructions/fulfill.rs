use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};
use anchor_spl::token::{self, Burn, TokenAccount, Transfer};

use crate::constants::*;
use crate::errors::BundleError;
use crate::events::OpenFulfilled;
use crate::utils::{
    aggregate_drawn, assert_ed25519_ix_matches, draw_rewards, expected_fulfill_msg,
    resolve_request,
};
use crate::FulfillOpen;

/// Oracle callback closing the open: verifies the oracle's ed25519 signature
/// over (request_id, random_value), resolves the pending request, draws the
/// rewards, burns the escrowed bundle token and pays the rewards out.
///
/// Remaining accounts carry one [reward_vault, opener_token_account] pair per
/// distinct drawn mint, in first-drawn order.
///
/// Tx layout must be: [ ed25519_verify, fulfill_open ]
pub fn fulfill_open<'info>(
    ctx: Context<'_, '_, 'info, 'info, FulfillOpen<'info>>,
    bundle_id: u64,
    opener: Pubkey,
    request_id: [u8; 32],
    random_value: [u8; 32],
) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require!(!cfg.paused, BundleError::Paused);
    require!(cfg.oracle_pubkey != Pubkey::default(), BundleError::OracleNotSet);

    // --- ed25519 introspection: the configured oracle signed this result ---
    let ix_sys = ctx.accounts.instructions.to_account_info();
    let current_ix = load_current_index_checked(&ix_sys)? as usize;
    require!(current_ix >= 1, BundleError::MissingOrInvalidEd25519Ix);

    let ed_ix = load_instruction_at_checked(current_ix - 1, &ix_sys)
        .map_err(|_| error!(BundleError::MissingOrInvalidEd25519Ix))?;

    let expected = expected_fulfill_msg(ctx.program_id, &request_id, &random_value);
    assert_ed25519_ix_matches(&ed_ix, &cfg.oracle_pubkey, expected.as_slice())?;

    let now = Clock::get()?.unix_timestamp;

    // Flips the slot to Resolved before any token movement; a replayed
    // callback dies here with UnknownRequest.
    resolve_request(
        &mut ctx.accounts.open_request,
        bundle_id,
        &opener,
        &request_id,
        now,
    )?;

    let count = ctx.accounts.bundle.rewards_per_open;
    let drawn = draw_rewards(&mut ctx.accounts.bundle.rewards, &random_value, count)?;
    let agg = aggregate_drawn(&drawn);

    require!(
        ctx.remaining_accounts.len() == agg.len() * 2,
        BundleError::RewardAccountMismatch
    );

    let bundle_le = bundle_id.to_le_bytes();
    let bundle_bump = ctx.accounts.bundle.bump;
    let bundle_signer: &[&[&[u8]]] = &[&[BUNDLE_SEED, &bundle_le, &[bundle_bump]]];

    // the opened token leaves supply for good
    token::burn(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Burn {
                mint: ctx.accounts.bundle_mint.to_account_info(),
                from: ctx.accounts.bundle_escrow.to_account_info(),
                authority: ctx.accounts.bundle.to_account_info(),
            },
            bundle_signer,
        ),
        1,
    )?;

    {
        let bundle = &mut ctx.accounts.bundle;
        bundle.circulating_supply = bundle
            .circulating_supply
            .checked_sub(1)
            .ok_or_else(|| error!(BundleError::MathOverflow))?;
    }

    for (i, (mint, units)) in agg.iter().enumerate() {
        let vault_ai = &ctx.remaining_accounts[i * 2];
        let dest_ai = &ctx.remaining_accounts[i * 2 + 1];

        let (expected_vault, _) = Pubkey::find_program_address(
            &[REWARD_VAULT_SEED, &bundle_le, mint.as_ref()],
            ctx.program_id,
        );
        require_keys_eq!(expected_vault, *vault_ai.key, BundleError::RewardAccountMismatch);

        let dest = Account::<TokenAccount>::try_from(dest_ai)?;
        require_keys_eq!(dest.mint, *mint, BundleError::RewardAccountMismatch);
        require_keys_eq!(dest.owner, opener, BundleError::RewardAccountMismatch);

        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: vault_ai.clone(),
                    to: dest_ai.clone(),
                    authority: ctx.accounts.bundle.to_account_info(),
                },
                bundle_signer,
            ),
            *units,
        )?;
    }

    emit!(OpenFulfilled {
        bundle_id,
        opener,
        request_id,
        rewards_drawn: count,
    });

    Ok(())
}

#[cfg(test)]
mod fulfill_tests {
    use crate::errors::BundleError;
    use crate::state::RequestStatus;
    use crate::utils::test_support::*;
    use crate::utils::{
        aggregate_drawn, begin_open, derive_request_id, draw_rewards, resolve_request,
        total_remaining,
    };
    use anchor_lang::prelude::Pubkey;

    #[test]
    fn replayed_callback_does_not_disburse_twice() {
        let opener = Pubkey::new_unique();
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        let mut pool = vec![record(mint_a, 2), record(mint_b, 2)];
        let mut req = fresh_request();

        let id = derive_request_id(9, &opener, 0, 500);
        begin_open(&mut req, 9, opener, id, 100).unwrap();

        let rv = [42u8; 32];
        resolve_request(&mut req, 9, &opener, &id, 160).unwrap();
        let first = draw_rewards(&mut pool, &rv, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(total_remaining(&pool), 2);

        // identical callback again: the slot is no longer Pending, so the
        // resolve fails and the pool is never touched
        assert_err(
            resolve_request(&mut req, 9, &opener, &id, 170),
            BundleError::UnknownRequest,
        );
        assert_eq!(total_remaining(&pool), 2);
        assert_eq!(req.status, RequestStatus::Resolved);
    }

    #[test]
    fn payout_pairs_match_aggregated_draw() {
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        let mut pool = vec![record(mint_a, 5), record(mint_b, 5)];

        let drawn = draw_rewards(&mut pool, &[3u8; 32], 4).unwrap();
        let agg = aggregate_drawn(&drawn);

        // one transfer per distinct mint, unit counts add back up
        let total: u64 = agg.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 4);
        for (mint, _) in agg.iter() {
            assert!(*mint == mint_a || *mint == mint_b);
        }
        let mut seen = agg.iter().map(|(m, _)| *m).collect::<Vec<_>>();
        seen.dedup();
        assert_eq!(seen.len(), agg.len());
    }

    #[test]
    fn resolved_supply_shrinks_by_one_per_open() {
        // four bundle tokens over an 8-unit pool at two rewards each: every
        // fulfillment removes exactly rewards_per_open units
        let mint = Pubkey::new_unique();
        let mut pool = vec![record(mint, 8)];
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();

        for n in 0..4u64 {
            let id = derive_request_id(1, &opener, n, 1_000 + n);
            begin_open(&mut req, 1, opener, id, 100).unwrap();
            resolve_request(&mut req, 1, &opener, &id, 150).unwrap();
            let drawn = draw_rewards(&mut pool, &[n as u8 + 1; 32], 2).unwrap();
            assert_eq!(drawn.len(), 2);
            assert_eq!(total_remaining(&pool), 8 - 2 * (n + 1));
        }
        assert_eq!(total_remaining(&pool), 0);
    }
}
