use anchor_lang::prelude::*;

#[error_code]
pub enum BundleError {
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Protocol paused")]
    Paused,

    // -----------------
    // Bundle creation
    // -----------------
    #[msg("Invalid open window (start must not be after end)")]
    InvalidWindow,
    #[msg("Rewards per open must be at least 1")]
    InvalidRewardsPerOpen,
    #[msg("No reward tokens deposited")]
    EmptyDeposit,
    #[msg("Deposited reward count must be a multiple of rewards per open")]
    IndivisibleDeposit,
    #[msg("Duplicate reward mint in deposit")]
    DuplicateRewardMint,
    #[msg("Too many distinct reward mints")]
    TooManyRewardKinds,
    #[msg("Reward amount must be positive")]
    InvalidAmount,

    // -----------------
    // Opening
    // -----------------
    #[msg("The window to open bundles has not started or has closed")]
    WindowClosed,
    #[msg("Opener owns no bundles of the given bundle id")]
    NoBundlesOwned,
    #[msg("Must wait for the pending open to be fulfilled")]
    OpenAlreadyPending,
    #[msg("Oracle reserve cannot cover the randomness fee")]
    InsufficientOracleFunds,

    // -----------------
    // Fulfillment
    // -----------------
    #[msg("Randomness request is unknown, already resolved, or forged")]
    UnknownRequest,
    #[msg("Reward pool holds fewer units than a full open requires")]
    PoolExhausted,
    #[msg("Reward account does not match the drawn reward")]
    RewardAccountMismatch,

    // -----------------
    // Oracle gateway
    // -----------------
    #[msg("Oracle pubkey not set")]
    OracleNotSet,
    #[msg("Oracle fee must be positive")]
    InvalidOracleFee,
    #[msg("Insufficient reserve funds")]
    InsufficientReserve,
    #[msg("Missing or invalid ed25519 verify instruction")]
    MissingOrInvalidEd25519Ix,
    #[msg("Ed25519 pubkey mismatch")]
    Ed25519PubkeyMismatch,
    #[msg("Ed25519 message mismatch")]
    Ed25519MessageMismatch,

    // -----------------
    // Sponsored opens
    // -----------------
    #[msg("Signed open intent nonce does not match the escrow counter")]
    IntentNonceMismatch,
    #[msg("Insufficient escrow funds")]
    InsufficientEscrow,

    // -----------------
    // Lifecycle
    // -----------------
    #[msg("Open request is still pending fulfillment")]
    RequestStillPending,

    #[msg("Math overflow")]
    MathOverflow,
}
