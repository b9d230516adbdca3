use anchor_lang::prelude::*;
use vrf_sol::program::VrfSol;
use vrf_sol::state::VrfConfiguration;

use crate::constants::{GAME_CONFIG_SEED, PLAYER_SEED};
use crate::events::RequestAbandoned;
use crate::state::{GameConfig, PlayerAccount};

/// Accounts for giving up on a request the oracle never answered.
///
/// The queue only allows this once the request's timeout window has passed.
#[derive(Accounts)]
pub struct AbandonRequest<'info> {
    /// Receives the refunded escrow.
    #[account(mut)]
    pub player: Signer<'info>,

    #[account(
        seeds = [GAME_CONFIG_SEED],
        bump = game_config.bump,
    )]
    pub game_config: Box<Account<'info, GameConfig>>,

    #[account(
        mut,
        seeds = [PLAYER_SEED, player.key().as_ref()],
        bump = player_data.bump,
    )]
    pub player_data: Account<'info, PlayerAccount>,

    #[account(address = game_config.vrf_config)]
    pub vrf_config: Box<Account<'info, VrfConfiguration>>,

    /// CHECK: Validated by the queue program during the CPI.
    #[account(mut)]
    pub vrf_request: UncheckedAccount<'info>,

    pub vrf_program: Program<'info, VrfSol>,
}

pub fn handler(ctx: Context<AbandonRequest>) -> Result<()> {
    let request_key = ctx.accounts.vrf_request.key();
    ctx.accounts.player_data.abandon(&request_key)?;

    let owner = ctx.accounts.player.key();
    let player_bump = ctx.accounts.player_data.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[PLAYER_SEED, owner.as_ref(), &[player_bump]]];

    let cpi_accounts = vrf_sol::cpi::accounts::CancelRequest {
        authority: ctx.accounts.player_data.to_account_info(),
        payer: ctx.accounts.player.to_account_info(),
        config: ctx.accounts.vrf_config.to_account_info(),
        request: ctx.accounts.vrf_request.to_account_info(),
    };
    vrf_sol::cpi::cancel_request(CpiContext::new_with_signer(
        ctx.accounts.vrf_program.to_account_info(),
        cpi_accounts,
        signer_seeds,
    ))?;

    emit!(RequestAbandoned {
        player: owner,
        request: request_key,
    });

    msg!("Request {} abandoned by {}", request_key, owner);
    Ok(())
}
