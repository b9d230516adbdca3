use anchor_lang::prelude::*;

use crate::errors::VrfError;
use crate::state::VrfConfiguration;

/// Accounts required to update the queue configuration.
#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    /// Current admin; must sign.
    pub admin: Signer<'info>,

    /// Queue configuration PDA to update.
    #[account(
        mut,
        seeds = [b"vrf-config"],
        bump = config.bump,
        constraint = config.admin == admin.key() @ VrfError::Unauthorized,
    )]
    pub config: Account<'info, VrfConfiguration>,
}

/// Optional field updates; `None` leaves the current value in place.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default)]
pub struct ConfigUpdate {
    pub authority: Option<Pubkey>,
    pub fee: Option<u64>,
    pub treasury: Option<Pubkey>,
    pub admin: Option<Pubkey>,
    pub request_timeout_slots: Option<u64>,
    pub paused: Option<bool>,
}

/// Update one or more queue configuration fields.
pub fn handler(ctx: Context<UpdateConfig>, update: ConfigUpdate) -> Result<()> {
    let config = &mut ctx.accounts.config;

    for key in [update.authority, update.treasury, update.admin].into_iter().flatten() {
        require!(key != Pubkey::default(), VrfError::ZeroAddressNotAllowed);
    }

    if let Some(authority) = update.authority {
        config.authority = authority;
    }
    if let Some(fee) = update.fee {
        config.fee = fee;
    }
    if let Some(treasury) = update.treasury {
        config.treasury = treasury;
    }
    if let Some(admin) = update.admin {
        config.admin = admin;
    }
    if let Some(timeout) = update.request_timeout_slots {
        config.request_timeout_slots = timeout;
    }
    if let Some(paused) = update.paused {
        config.paused = paused;
        msg!("VRF queue paused={}", paused);
    }

    Ok(())
}
