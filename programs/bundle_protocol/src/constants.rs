// Centralized Protocol Constants

// -----------------
// PDA seeds
// -----------------
pub const CONFIG_SEED: &[u8] = b"config_v1";
pub const FEE_VAULT_SEED: &[u8] = b"fee_vault_v1";
pub const BUNDLE_REGISTRY_SEED: &[u8] = b"bundle_registry_v1";
pub const BUNDLE_SEED: &[u8] = b"bundle_v1";
pub const BUNDLE_MINT_SEED: &[u8] = b"bundle_mint_v1";
pub const BUNDLE_ESCROW_SEED: &[u8] = b"bundle_escrow_v1";
pub const CREATOR_HOLDING_SEED: &[u8] = b"creator_holding_v1";
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault_v1";
pub const OPEN_REQUEST_SEED: &[u8] = b"open_request_v1";

pub const USER_ESCROW_SEED: &[u8] = b"user_escrow_v1";
pub const USER_ESCROW_VAULT_SEED: &[u8] = b"user_escrow_vault_v1";

// -----------------
// Limits & defaults
// -----------------

/// Maximum number of distinct reward mints a single bundle may hold.
/// Bounds the Bundle account size (see `Bundle::INIT_SPACE`).
pub const MAX_REWARD_KINDS: usize = 32;

/// Sentinel for `open_end_ts`: the open window never expires.
pub const NO_EXPIRY: i64 = 0;

/// Default oracle fee in lamports (0.002 SOL). Dev default; check current config.
pub const DEFAULT_ORACLE_FEE_LAMPORTS: u64 = 2_000_000;

/// Initial version for account structures.
pub const INITIAL_VERSION: u16 = 1;

/// Starting bundle ID for a new registry.
pub const INITIAL_BUNDLE_ID: u64 = 0;
