use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use solana_sha256_hasher::hashv;

use crate::{
    constants::NO_EXPIRY,
    errors::BundleError,
    state::{Bundle, OpenRequest, RequestStatus, RewardRecord},
};

// Ed25519SigVerify111111111111111111111111111
pub fn ed25519_program_id() -> Pubkey {
    Pubkey::new_from_array([
        3, 125, 70, 214, 124, 147, 251, 190, 18, 249, 66, 143, 131, 141, 64, 255,
        5, 112, 116, 73, 39, 244, 138, 100, 252, 202, 112, 68, 128, 0, 0, 0,
    ])
}

// -------------------------
// Open window
// -------------------------

/// The open window is [start, end). `end == NO_EXPIRY` never closes.
pub fn check_open_window(now: i64, start_ts: i64, end_ts: i64) -> Result<()> {
    require!(now >= start_ts, BundleError::WindowClosed);
    require!(end_ts == NO_EXPIRY || now < end_ts, BundleError::WindowClosed);
    Ok(())
}

pub fn validate_open_eligibility(bundle: &Bundle, opener_balance: u64, now: i64) -> Result<()> {
    check_open_window(now, bundle.open_start_ts, bundle.open_end_ts)?;
    require!(opener_balance > 0, BundleError::NoBundlesOwned);
    Ok(())
}

/// Validates bundle creation parameters and returns the number of bundle
/// tokens mintable from the deposit (one per rewards_per_open-sized group).
pub fn validate_bundle_params(
    window_start: i64,
    window_end: i64,
    rewards_per_open: u64,
    total_units: u64,
) -> Result<u64> {
    require!(rewards_per_open >= 1, BundleError::InvalidRewardsPerOpen);
    require!(
        window_end == NO_EXPIRY || window_start <= window_end,
        BundleError::InvalidWindow
    );
    require!(total_units > 0, BundleError::EmptyDeposit);
    require!(
        total_units % rewards_per_open == 0,
        BundleError::IndivisibleDeposit
    );
    Ok(total_units / rewards_per_open)
}

// -------------------------
// Open request tracker cores
// -------------------------

/// Marks the (bundle, opener) slot pending. The slot must not already hold an
/// in-flight request; a Resolved (or never-used) slot is free for reuse.
pub fn begin_open(
    request: &mut OpenRequest,
    bundle_id: u64,
    opener: Pubkey,
    request_id: [u8; 32],
    now: i64,
) -> Result<()> {
    require!(
        request.status != RequestStatus::Pending,
        BundleError::OpenAlreadyPending
    );

    request.bundle_id = bundle_id;
    request.opener = opener;
    request.request_id = request_id;
    request.status = RequestStatus::Pending;
    request.created_ts = now;
    request.resolved_ts = 0;

    Ok(())
}

/// Destructive resolve: Pending -> Resolved, exactly once. A replayed or
/// forged id, or a slot that was never pending, is rejected without touching
/// the request.
pub fn resolve_request(
    request: &mut OpenRequest,
    bundle_id: u64,
    opener: &Pubkey,
    request_id: &[u8; 32],
    now: i64,
) -> Result<()> {
    require!(
        request.status == RequestStatus::Pending,
        BundleError::UnknownRequest
    );
    require!(request.bundle_id == bundle_id, BundleError::UnknownRequest);
    require_keys_eq!(request.opener, *opener, BundleError::UnknownRequest);
    require!(&request.request_id == request_id, BundleError::UnknownRequest);

    request.status = RequestStatus::Resolved;
    request.resolved_ts = now;

    Ok(())
}

// -------------------------
// Oracle fee reserve
// -------------------------

/// The reserve must cover the fee on top of its rent floor. Checked before any
/// state change so a failed open leaves no residue.
pub fn charge_oracle_fee(reserve_lamports: u64, rent_floor: u64, fee: u64) -> Result<()> {
    require!(
        reserve_lamports >= rent_floor.saturating_add(fee),
        BundleError::InsufficientOracleFunds
    );
    Ok(())
}

// -------------------------
// Request id derivation
// -------------------------

/// Opaque request identifier, fixed at request time (the oracle echoes it back
/// on fulfillment). The config-wide nonce makes ids unique across reuses of
/// the same (bundle, opener) slot.
pub fn derive_request_id(bundle_id: u64, opener: &Pubkey, nonce: u64, slot: u64) -> [u8; 32] {
    hashv(&[
        b"open_request".as_ref(),
        bundle_id.to_le_bytes().as_ref(),
        opener.as_ref(),
        nonce.to_le_bytes().as_ref(),
        slot.to_le_bytes().as_ref(),
    ])
    .to_bytes()
}

// -------------------------
// Weighted draw without replacement
// -------------------------

/// One pseudorandom sub-value per draw index, all derived from the oracle's
/// single random value. Keeps entropy consumption bounded and the draw
/// sequence deterministic.
pub fn derive_draw_value(random_value: &[u8; 32], draw_index: u64) -> u64 {
    let h = hashv(&[
        b"draw".as_ref(),
        random_value.as_ref(),
        draw_index.to_le_bytes().as_ref(),
    ])
    .to_bytes();

    u64::from_le_bytes([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7]])
}

pub fn total_remaining(records: &[RewardRecord]) -> u64 {
    records.iter().map(|r| r.remaining).sum()
}

/// Draws `count` reward units without replacement, weighted by each record's
/// remaining supply. Each pick walks the cumulative supplies to the derived
/// target and decrements the chosen record. Same records + random value +
/// count always yields the same sequence.
pub fn draw_rewards(
    records: &mut [RewardRecord],
    random_value: &[u8; 32],
    count: u64,
) -> Result<Vec<Pubkey>> {
    let mut total = total_remaining(records);
    require!(total >= count && count > 0, BundleError::PoolExhausted);

    let mut drawn = Vec::with_capacity(count as usize);
    for i in 0..count {
        let target = derive_draw_value(random_value, i) % total;

        let mut acc = 0u64;
        for rec in records.iter_mut() {
            acc += rec.remaining;
            if target < acc {
                rec.remaining -= 1;
                drawn.push(rec.mint);
                break;
            }
        }

        total -= 1;
    }

    Ok(drawn)
}

/// Collapses a draw sequence into (mint, units) pairs in first-drawn order,
/// for per-mint disbursement transfers.
pub fn aggregate_drawn(drawn: &[Pubkey]) -> Vec<(Pubkey, u64)> {
    let mut out: Vec<(Pubkey, u64)> = Vec::new();
    for mint in drawn {
        match out.iter_mut().find(|(m, _)| m == mint) {
            Some((_, n)) => *n += 1,
            None => out.push((*mint, 1)),
        }
    }
    out
}

// -------------------------
// Canonical signed messages
// -------------------------

/// Message an opener signs to authorize a sponsored open executed by a relayer.
pub fn expected_open_msg(
    program_id: &Pubkey,
    bundle_id: u64,
    opener: &Pubkey,
    intent_nonce: u64,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(b"bundle-protocol:open_v1".len() + 32 + 8 + 32 + 8);
    out.extend_from_slice(b"bundle-protocol:open_v1");
    out.extend_from_slice(program_id.as_ref());
    out.extend_from_slice(&bundle_id.to_le_bytes());
    out.extend_from_slice(opener.as_ref());
    out.extend_from_slice(&intent_nonce.to_le_bytes());
    out
}

/// Message the oracle signs when fulfilling a request.
pub fn expected_fulfill_msg(
    program_id: &Pubkey,
    request_id: &[u8; 32],
    random_value: &[u8; 32],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(b"bundle-protocol:fulfill_v1".len() + 32 + 32 + 32);
    out.extend_from_slice(b"bundle-protocol:fulfill_v1");
    out.extend_from_slice(program_id.as_ref());
    out.extend_from_slice(request_id);
    out.extend_from_slice(random_value);
    out
}

// -------------------------
// Ed25519 instruction introspection
// -------------------------

pub fn parse_ed25519_ix_pubkey_and_msg(ix: &Instruction) -> Result<(Pubkey, Vec<u8>)> {
    require!(
        ix.program_id == ed25519_program_id(),
        BundleError::MissingOrInvalidEd25519Ix
    );

    let data = &ix.data;
    require!(data.len() >= 16, BundleError::MissingOrInvalidEd25519Ix);

    let num_sigs = data[0];
    require!(num_sigs == 1, BundleError::MissingOrInvalidEd25519Ix);

    // Require self-contained offsets (instruction_index == u16::MAX); anything
    // else lets the signed payload live in a different instruction.
    let sig_ix = u16::from_le_bytes([data[4], data[5]]);
    let pk_ix = u16::from_le_bytes([data[8], data[9]]);
    let msg_ix = u16::from_le_bytes([data[14], data[15]]);
    require!(sig_ix == u16::MAX, BundleError::MissingOrInvalidEd25519Ix);
    require!(pk_ix == u16::MAX, BundleError::MissingOrInvalidEd25519Ix);
    require!(msg_ix == u16::MAX, BundleError::MissingOrInvalidEd25519Ix);

    let pk_off = u16::from_le_bytes([data[6], data[7]]) as usize;
    let msg_off = u16::from_le_bytes([data[10], data[11]]) as usize;
    let msg_sz = u16::from_le_bytes([data[12], data[13]]) as usize;

    // bounds must hold without wraparound
    let pk_end = pk_off
        .checked_add(32)
        .ok_or_else(|| error!(BundleError::MissingOrInvalidEd25519Ix))?;
    let msg_end = msg_off
        .checked_add(msg_sz)
        .ok_or_else(|| error!(BundleError::MissingOrInvalidEd25519Ix))?;
    require!(pk_end <= data.len(), BundleError::MissingOrInvalidEd25519Ix);
    require!(msg_end <= data.len(), BundleError::MissingOrInvalidEd25519Ix);

    let pk_bytes: [u8; 32] = data[pk_off..pk_end]
        .try_into()
        .map_err(|_| error!(BundleError::MissingOrInvalidEd25519Ix))?;
    let msg = data[msg_off..msg_end].to_vec();

    Ok((Pubkey::new_from_array(pk_bytes), msg))
}

pub fn assert_ed25519_ix_matches(
    ix: &Instruction,
    expected_pubkey: &Pubkey,
    expected_msg: &[u8],
) -> Result<()> {
    let (pk, msg) = parse_ed25519_ix_pubkey_and_msg(ix)?;

    require_keys_eq!(pk, *expected_pubkey, BundleError::Ed25519PubkeyMismatch);
    require!(
        msg.as_slice() == expected_msg,
        BundleError::Ed25519MessageMismatch
    );

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::errors::BundleError;
    use anchor_lang::error::Error;

    pub fn code_of(expected: BundleError) -> u32 {
        match Error::from(expected) {
            Error::AnchorError(e) => e.error_code_number,
            Error::ProgramError(_) => unreachable!(),
        }
    }

    pub fn assert_err<T: std::fmt::Debug>(res: Result<T>, expected: BundleError) {
        match res.expect_err("expected an error") {
            Error::AnchorError(e) => assert_eq!(e.error_code_number, code_of(expected)),
            Error::ProgramError(e) => panic!("unexpected program error: {:?}", e),
        }
    }

    pub fn record(mint: Pubkey, remaining: u64) -> RewardRecord {
        RewardRecord { mint, remaining }
    }

    pub fn fresh_request() -> OpenRequest {
        OpenRequest {
            bundle_id: 0,
            opener: Pubkey::default(),
            bump: 0,
            request_id: [0u8; 32],
            status: RequestStatus::Idle,
            created_ts: 0,
            resolved_ts: 0,
        }
    }
}

#[cfg(test)]
mod window_tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn open_inside_window_is_eligible() {
        assert!(check_open_window(1_050, 1_000, 1_100).is_ok());
        assert!(check_open_window(1_000, 1_000, 1_100).is_ok());
    }

    #[test]
    fn open_after_window_end_fails() {
        // window [now, now+100), attempt at now+150
        assert_err(check_open_window(1_150, 1_000, 1_100), BundleError::WindowClosed);
        // end is exclusive
        assert_err(check_open_window(1_100, 1_000, 1_100), BundleError::WindowClosed);
    }

    #[test]
    fn open_before_window_start_fails() {
        assert_err(check_open_window(999, 1_000, 1_100), BundleError::WindowClosed);
    }

    #[test]
    fn zero_end_means_no_expiry() {
        assert!(check_open_window(i64::MAX, 0, NO_EXPIRY).is_ok());
        assert!(check_open_window(5, 0, NO_EXPIRY).is_ok());
    }

    #[test]
    fn zero_balance_opener_is_rejected() {
        let bundle = Bundle {
            bundle_id: 1,
            bump: 0,
            creator: Pubkey::new_unique(),
            bundle_mint: Pubkey::new_unique(),
            bundle_mint_bump: 0,
            escrow: Pubkey::new_unique(),
            escrow_bump: 0,
            open_start_ts: 0,
            open_end_ts: NO_EXPIRY,
            rewards_per_open: 1,
            circulating_supply: 3,
            created_ts: 0,
            rewards: vec![record(Pubkey::new_unique(), 3)],
        };
        assert_err(
            validate_open_eligibility(&bundle, 0, 10),
            BundleError::NoBundlesOwned,
        );
        assert!(validate_open_eligibility(&bundle, 1, 10).is_ok());
    }
}

#[cfg(test)]
mod creation_tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn deposit_must_be_positive_multiple_of_rewards_per_open() {
        assert_eq!(validate_bundle_params(0, 0, 2, 4).unwrap(), 2);
        assert_eq!(validate_bundle_params(0, 0, 1, 7).unwrap(), 7);
        assert_err(validate_bundle_params(0, 0, 2, 5), BundleError::IndivisibleDeposit);
        assert_err(validate_bundle_params(0, 0, 2, 0), BundleError::EmptyDeposit);
        assert_err(validate_bundle_params(0, 0, 0, 4), BundleError::InvalidRewardsPerOpen);
    }

    #[test]
    fn window_order_is_enforced() {
        assert_err(validate_bundle_params(200, 100, 1, 2), BundleError::InvalidWindow);
        assert!(validate_bundle_params(100, 200, 1, 2).is_ok());
        // end == 0 sentinel: no expiry, any start accepted
        assert!(validate_bundle_params(1_700_000_000, NO_EXPIRY, 1, 2).is_ok());
    }
}

#[cfg(test)]
mod tracker_tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn second_open_while_pending_is_rejected() {
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();

        begin_open(&mut req, 7, opener, [1u8; 32], 100).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);

        assert_err(
            begin_open(&mut req, 7, opener, [2u8; 32], 101),
            BundleError::OpenAlreadyPending,
        );
        // the in-flight request survives the failed attempt untouched
        assert_eq!(req.request_id, [1u8; 32]);

        resolve_request(&mut req, 7, &opener, &[1u8; 32], 200).unwrap();
        assert_eq!(req.status, RequestStatus::Resolved);

        // slot is free again after fulfillment
        begin_open(&mut req, 7, opener, [3u8; 32], 300).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.request_id, [3u8; 32]);
    }

    #[test]
    fn resolve_is_single_use() {
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();
        begin_open(&mut req, 3, opener, [9u8; 32], 10).unwrap();

        resolve_request(&mut req, 3, &opener, &[9u8; 32], 20).unwrap();
        // replayed callback with the same id: no state change, explicit error
        assert_err(
            resolve_request(&mut req, 3, &opener, &[9u8; 32], 30),
            BundleError::UnknownRequest,
        );
        assert_eq!(req.resolved_ts, 20);
    }

    #[test]
    fn forged_or_mismatched_ids_are_rejected_without_state_change() {
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();
        begin_open(&mut req, 3, opener, [9u8; 32], 10).unwrap();

        assert_err(
            resolve_request(&mut req, 3, &opener, &[8u8; 32], 20),
            BundleError::UnknownRequest,
        );
        assert_err(
            resolve_request(&mut req, 4, &opener, &[9u8; 32], 20),
            BundleError::UnknownRequest,
        );
        assert_err(
            resolve_request(&mut req, 3, &Pubkey::new_unique(), &[9u8; 32], 20),
            BundleError::UnknownRequest,
        );
        assert_eq!(req.status, RequestStatus::Pending);

        resolve_request(&mut req, 3, &opener, &[9u8; 32], 25).unwrap();
    }

    #[test]
    fn empty_reserve_fails_before_any_tracker_state_exists() {
        let opener = Pubkey::new_unique();
        let mut req = fresh_request();
        let rent_floor = 890_880u64;
        let fee = 2_000_000u64;

        // handler order: charge the fee first, only then create the request
        assert_err(
            charge_oracle_fee(rent_floor, rent_floor, fee),
            BundleError::InsufficientOracleFunds,
        );
        assert_eq!(req.status, RequestStatus::Idle);

        // a retry with a funded reserve succeeds cleanly
        charge_oracle_fee(rent_floor + fee, rent_floor, fee).unwrap();
        begin_open(&mut req, 1, opener, [4u8; 32], 50).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
    }

    #[test]
    fn request_ids_are_unique_per_nonce() {
        let opener = Pubkey::new_unique();
        let a = derive_request_id(1, &opener, 0, 100);
        let b = derive_request_id(1, &opener, 1, 100);
        let c = derive_request_id(1, &opener, 0, 101);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_request_id(1, &opener, 0, 100));
    }
}

#[cfg(test)]
mod draw_tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn draw_is_deterministic() {
        let mints: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let make_pool = || -> Vec<RewardRecord> {
            mints.iter().map(|m| record(*m, 5)).collect()
        };
        let rv = [42u8; 32];

        let mut a = make_pool();
        let mut b = make_pool();
        let drawn_a = draw_rewards(&mut a, &rv, 7).unwrap();
        let drawn_b = draw_rewards(&mut b, &rv, 7).unwrap();

        assert_eq!(drawn_a, drawn_b);
        assert_eq!(a, b);
    }

    #[test]
    fn two_opens_exhaust_a_four_by_one_pool_exactly() {
        // 4 reward mints, supply 1 each, rewards_per_open = 2
        let mints: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let mut pool: Vec<RewardRecord> = mints.iter().map(|m| record(*m, 1)).collect();
        let rewards_per_open = 2u64;

        assert_eq!(total_remaining(&pool) % rewards_per_open, 0);

        let first = draw_rewards(&mut pool, &[7u8; 32], rewards_per_open).unwrap();
        assert_eq!(first.len(), 2);
        assert_ne!(first[0], first[1]);
        assert_eq!(total_remaining(&pool), 2);
        assert_eq!(total_remaining(&pool) % rewards_per_open, 0);

        let second = draw_rewards(&mut pool, &[8u8; 32], rewards_per_open).unwrap();
        assert_eq!(second.len(), 2);
        assert_ne!(second[0], second[1]);
        assert_eq!(total_remaining(&pool), 0);

        // no unit drawn twice across both opens: the union is the whole pool
        let mut all = first;
        all.extend(second);
        all.sort();
        let mut expected = mints.clone();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn exhausted_pool_is_rejected() {
        let mut pool = vec![record(Pubkey::new_unique(), 1)];
        assert_err(draw_rewards(&mut pool, &[1u8; 32], 2), BundleError::PoolExhausted);
        // the supply check runs before any decrement
        assert_eq!(total_remaining(&pool), 1);
    }

    #[test]
    fn zero_supply_records_are_never_drawn() {
        let dead = Pubkey::new_unique();
        let live = Pubkey::new_unique();
        let mut pool = vec![record(dead, 0), record(live, 2)];

        let drawn = draw_rewards(&mut pool, &[3u8; 32], 2).unwrap();
        assert_eq!(drawn, vec![live, live]);
        assert_eq!(pool[0].remaining, 0);
        assert_eq!(pool[1].remaining, 0);
    }

    #[test]
    fn divisibility_invariant_holds_across_draws() {
        let mut pool = vec![
            record(Pubkey::new_unique(), 3),
            record(Pubkey::new_unique(), 2),
            record(Pubkey::new_unique(), 1),
        ];
        let rewards_per_open = 3u64;
        assert_eq!(total_remaining(&pool) % rewards_per_open, 0);

        draw_rewards(&mut pool, &[11u8; 32], rewards_per_open).unwrap();
        assert_eq!(total_remaining(&pool) % rewards_per_open, 0);

        draw_rewards(&mut pool, &[12u8; 32], rewards_per_open).unwrap();
        assert_eq!(total_remaining(&pool), 0);
    }

    #[test]
    fn aggregation_preserves_first_drawn_order_and_counts() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let agg = aggregate_drawn(&[a, b, a, a]);
        assert_eq!(agg, vec![(a, 3), (b, 1)]);
    }
}
