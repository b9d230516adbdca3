use anchor_lang::prelude::*;

use crate::errors::VrfError;
use crate::state::VrfConfiguration;

/// Accounts required to initialize the queue configuration singleton.
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The initial admin who pays for account creation.
    #[account(mut)]
    pub admin: Signer<'info>,

    /// The oracle's Ed25519 public key that will sign VRF fulfillments.
    /// CHECK: Stored as configuration; validated to be non-zero.
    pub authority: UncheckedAccount<'info>,

    /// Receives escrowed fees on fulfillment.
    /// CHECK: Stored as configuration; validated to be non-zero.
    pub treasury: UncheckedAccount<'info>,

    /// Singleton configuration PDA. Seeds: `["vrf-config"]`.
    #[account(
        init,
        payer = admin,
        space = 8 + VrfConfiguration::INIT_SPACE,
        seeds = [b"vrf-config"],
        bump,
    )]
    pub config: Account<'info, VrfConfiguration>,

    pub system_program: Program<'info, System>,
}

/// Initialize the queue configuration with an empty request counter.
pub fn handler(ctx: Context<Initialize>, fee: u64, request_timeout_slots: u64) -> Result<()> {
    require!(
        ctx.accounts.authority.key() != Pubkey::default(),
        VrfError::ZeroAddressNotAllowed
    );
    require!(
        ctx.accounts.treasury.key() != Pubkey::default(),
        VrfError::ZeroAddressNotAllowed
    );

    let config = &mut ctx.accounts.config;
    config.admin = ctx.accounts.admin.key();
    config.authority = ctx.accounts.authority.key();
    config.treasury = ctx.accounts.treasury.key();
    config.fee = fee;
    config.request_counter = 0;
    config.request_timeout_slots = request_timeout_slots;
    config.paused = false;
    config.bump = ctx.bumps.config;

    msg!(
        "VRF queue initialized: authority={}, fee={}, timeout_slots={}",
        config.authority,
        fee,
        request_timeout_slots
    );
    Ok(())
}
