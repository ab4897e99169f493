use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::errors::BundleError;
use crate::state::{Bundle, BundleRegistry, Config, OpenRequest, RequestStatus, UserEscrow};

#[derive(Accounts)]
pub struct InitializeConfig<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + Config::INIT_SPACE,
        seeds = [crate::CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: system-owned PDA used only as the oracle fee reserve (lamports,
    /// no data). Address enforced by seeds/bump.
    #[account(
        init,
        payer = admin,
        space = 0,
        owner = anchor_lang::solana_program::system_program::ID,
        seeds = [crate::FEE_VAULT_SEED],
        bump
    )]
    pub fee_vault: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct SetPause<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
pub struct SetOracleConfig<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
pub struct FundOracleReserve<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: system-owned lamport reserve PDA. Address enforced by seeds/bump.
    #[account(
        mut,
        seeds = [crate::FEE_VAULT_SEED],
        bump = config.fee_vault_bump
    )]
    pub fee_vault: UncheckedAccount<'info>,

    #[account(mut)]
    pub funder: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct WithdrawOracleReserve<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: system-owned lamport reserve PDA. Address enforced by seeds/bump.
    #[account(
        mut,
        seeds = [crate::FEE_VAULT_SEED],
        bump = config.fee_vault_bump
    )]
    pub fee_vault: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitializeBundleRegistry<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init,
        payer = admin,
        space = 8 + BundleRegistry::INIT_SPACE,
        seeds = [crate::BUNDLE_REGISTRY_SEED, config.key().as_ref()],
        bump
    )]
    pub bundle_registry: Account<'info, BundleRegistry>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct CreateBundle<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_REGISTRY_SEED, config.key().as_ref()],
        bump = bundle_registry.bump,
    )]
    pub bundle_registry: Account<'info, BundleRegistry>,

    #[account(
        init,
        payer = creator,
        space = 8 + Bundle::INIT_SPACE,
        seeds = [crate::BUNDLE_SEED, bundle_registry.next_bundle_id.to_le_bytes().as_ref()],
        bump
    )]
    pub bundle: Account<'info, Bundle>,

    /// Bundle token mint (0 decimals), minted once at creation and burned as
    /// opens are fulfilled. Mint authority is the bundle PDA.
    #[account(
        init,
        payer = creator,
        seeds = [crate::BUNDLE_MINT_SEED, bundle_registry.next_bundle_id.to_le_bytes().as_ref()],
        bump,
        mint::decimals = 0,
        mint::authority = bundle
    )]
    pub bundle_mint: Account<'info, Mint>,

    /// Holds bundle tokens locked by in-flight opens until they are burned.
    #[account(
        init,
        payer = creator,
        seeds = [crate::BUNDLE_ESCROW_SEED, bundle_registry.next_bundle_id.to_le_bytes().as_ref()],
        bump,
        token::mint = bundle_mint,
        token::authority = bundle
    )]
    pub bundle_escrow: Account<'info, TokenAccount>,

    /// Receives the freshly minted bundle tokens; owned by the creator.
    #[account(
        init,
        payer = creator,
        seeds = [crate::CREATOR_HOLDING_SEED, bundle_registry.next_bundle_id.to_le_bytes().as_ref()],
        bump,
        token::mint = bundle_mint,
        token::authority = creator
    )]
    pub creator_holding: Account<'info, TokenAccount>,

    #[account(mut)]
    pub creator: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
    // remaining_accounts: [reward_mint, creator_source, reward_vault] per
    // reward kind, in deposit order
}

#[derive(Accounts)]
#[instruction(bundle_id: u64)]
pub struct OpenBundle<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.bump
    )]
    pub bundle: Account<'info, Bundle>,

    #[account(address = bundle.bundle_mint)]
    pub bundle_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = opener_bundle_ata.owner == opener.key() @ BundleError::Unauthorized,
        constraint = opener_bundle_ata.mint == bundle_mint.key() @ BundleError::Unauthorized
    )]
    pub opener_bundle_ata: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_ESCROW_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.escrow_bump
    )]
    pub bundle_escrow: Account<'info, TokenAccount>,

    /// CHECK: system-owned lamport reserve PDA. Address enforced by seeds/bump.
    #[account(
        mut,
        seeds = [crate::FEE_VAULT_SEED],
        bump = config.fee_vault_bump
    )]
    pub fee_vault: UncheckedAccount<'info>,

    /// CHECK: fee destination; address pinned to the configured collector.
    #[account(
        mut,
        address = config.oracle_fee_collector
    )]
    pub oracle_fee_collector: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = opener,
        space = 8 + OpenRequest::INIT_SPACE,
        seeds = [crate::OPEN_REQUEST_SEED, bundle_id.to_le_bytes().as_ref(), opener.key().as_ref()],
        bump
    )]
    pub open_request: Account<'info, OpenRequest>,

    #[account(mut)]
    pub opener: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(bundle_id: u64)]
pub struct InitUserEscrow<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        seeds = [crate::BUNDLE_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.bump
    )]
    pub bundle: Account<'info, Bundle>,

    #[account(address = bundle.bundle_mint)]
    pub bundle_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = user,
        space = 8 + UserEscrow::INIT_SPACE,
        seeds = [crate::USER_ESCROW_SEED, bundle_id.to_le_bytes().as_ref(), user.key().as_ref()],
        bump
    )]
    pub user_escrow: Account<'info, UserEscrow>,

    #[account(
        init,
        payer = user,
        seeds = [crate::USER_ESCROW_VAULT_SEED, bundle_id.to_le_bytes().as_ref(), user.key().as_ref()],
        bump,
        token::mint = bundle_mint,
        token::authority = user_escrow
    )]
    pub user_escrow_vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub user: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
#[instruction(bundle_id: u64)]
pub struct DepositEscrow<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        seeds = [crate::BUNDLE_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.bump
    )]
    pub bundle: Account<'info, Bundle>,

    #[account(address = bundle.bundle_mint)]
    pub bundle_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::USER_ESCROW_SEED, bundle_id.to_le_bytes().as_ref(), user.key().as_ref()],
        bump = user_escrow.bump
    )]
    pub user_escrow: Account<'info, UserEscrow>,

    #[account(
        mut,
        seeds = [crate::USER_ESCROW_VAULT_SEED, bundle_id.to_le_bytes().as_ref(), user.key().as_ref()],
        bump = user_escrow.vault_bump,
        constraint = user_escrow_vault.mint == bundle_mint.key(),
        constraint = user_escrow_vault.owner == user_escrow.key()
    )]
    pub user_escrow_vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        mut,
        constraint = user_bundle_ata.owner == user.key(),
        constraint = user_bundle_ata.mint == bundle_mint.key()
    )]
    pub user_bundle_ata: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
#[instruction(bundle_id: u64)]
pub struct WithdrawEscrow<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        seeds = [crate::BUNDLE_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.bump
    )]
    pub bundle: Account<'info, Bundle>,

    #[account(address = bundle.bundle_mint)]
    pub bundle_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::USER_ESCROW_SEED, bundle_id.to_le_bytes().as_ref(), user.key().as_ref()],
        bump = user_escrow.bump
    )]
    pub user_escrow: Account<'info, UserEscrow>,

    #[account(
        mut,
        seeds = [crate::USER_ESCROW_VAULT_SEED, bundle_id.to_le_bytes().as_ref(), user.key().as_ref()],
        bump = user_escrow.vault_bump,
        constraint = user_escrow_vault.mint == bundle_mint.key(),
        constraint = user_escrow_vault.owner == user_escrow.key()
    )]
    pub user_escrow_vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        mut,
        constraint = user_bundle_ata.owner == user.key(),
        constraint = user_bundle_ata.mint == bundle_mint.key()
    )]
    pub user_bundle_ata: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
#[instruction(bundle_id: u64, opener: Pubkey)]
pub struct OpenBundleSigned<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.bump
    )]
    pub bundle: Account<'info, Bundle>,

    #[account(address = bundle.bundle_mint)]
    pub bundle_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::USER_ESCROW_SEED, bundle_id.to_le_bytes().as_ref(), opener.as_ref()],
        bump = user_escrow.bump
    )]
    pub user_escrow: Account<'info, UserEscrow>,

    #[account(
        mut,
        seeds = [crate::USER_ESCROW_VAULT_SEED, bundle_id.to_le_bytes().as_ref(), opener.as_ref()],
        bump = user_escrow.vault_bump,
        constraint = user_escrow_vault.mint == bundle_mint.key(),
        constraint = user_escrow_vault.owner == user_escrow.key()
    )]
    pub user_escrow_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_ESCROW_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.escrow_bump
    )]
    pub bundle_escrow: Account<'info, TokenAccount>,

    /// CHECK: system-owned lamport reserve PDA. Address enforced by seeds/bump.
    #[account(
        mut,
        seeds = [crate::FEE_VAULT_SEED],
        bump = config.fee_vault_bump
    )]
    pub fee_vault: UncheckedAccount<'info>,

    /// CHECK: fee destination; address pinned to the configured collector.
    #[account(
        mut,
        address = config.oracle_fee_collector
    )]
    pub oracle_fee_collector: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + OpenRequest::INIT_SPACE,
        seeds = [crate::OPEN_REQUEST_SEED, bundle_id.to_le_bytes().as_ref(), opener.as_ref()],
        bump
    )]
    pub open_request: Account<'info, OpenRequest>,

    /// Relayer paying for the transaction; never the effective caller.
    #[account(mut)]
    pub payer: Signer<'info>,

    /// CHECK: instruction sysvar (for ed25519 introspection). Address enforced.
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(bundle_id: u64, opener: Pubkey)]
pub struct FulfillOpen<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.bump
    )]
    pub bundle: Account<'info, Bundle>,

    #[account(mut, address = bundle.bundle_mint)]
    pub bundle_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::BUNDLE_ESCROW_SEED, bundle_id.to_le_bytes().as_ref()],
        bump = bundle.escrow_bump
    )]
    pub bundle_escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [crate::OPEN_REQUEST_SEED, bundle_id.to_le_bytes().as_ref(), opener.as_ref()],
        bump = open_request.bump
    )]
    pub open_request: Account<'info, OpenRequest>,

    /// CHECK: instruction sysvar (for ed25519 introspection). Address enforced.
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    // remaining_accounts: [reward_vault, opener_token_account] per distinct
    // drawn mint, in first-drawn order
}

#[derive(Accounts)]
#[instruction(bundle_id: u64)]
pub struct CloseOpenRequest<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [crate::OPEN_REQUEST_SEED, bundle_id.to_le_bytes().as_ref(), opener.key().as_ref()],
        bump = open_request.bump,
        close = opener,
        constraint = open_request.opener == opener.key() @ BundleError::Unauthorized,
        constraint = open_request.status == RequestStatus::Resolved @ BundleError::RequestStillPending
    )]
    pub open_request: Account<'info, OpenRequest>,

    #[account(mut)]
    pub opener: Signer<'info>,
}
