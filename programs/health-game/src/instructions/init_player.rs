use anchor_lang::prelude::*;

use crate::constants::PLAYER_SEED;
use crate::events::PlayerCreated;
use crate::state::PlayerAccount;

#[derive(Accounts)]
pub struct InitPlayer<'info> {
    #[account(mut)]
    pub player: Signer<'info>,

    /// `init_if_needed` so a second call reaches the handler and reports
    /// `AlreadyExists` instead of a generic system program error.
    #[account(
        init_if_needed,
        payer = player,
        space = 8 + PlayerAccount::INIT_SPACE,
        seeds = [PLAYER_SEED, player.key().as_ref()],
        bump,
    )]
    pub player_data: Account<'info, PlayerAccount>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitPlayer>) -> Result<()> {
    let owner = ctx.accounts.player.key();
    let player_data = &mut ctx.accounts.player_data;
    player_data.initialize(owner, ctx.bumps.player_data)?;

    emit!(PlayerCreated {
        player: owner,
        health: player_data.health,
    });

    msg!("Player {} created with health {}", owner, player_data.health);
    Ok(())
}
