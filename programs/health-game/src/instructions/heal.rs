use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{burn, Burn, Mint, Token, TokenAccount};

use crate::constants::{GAME_CONFIG_SEED, PLAYER_SEED};
use crate::events::PlayerHealed;
use crate::ledger::heal_charge;
use crate::state::{GameConfig, PlayerAccount};

#[derive(Accounts)]
pub struct Heal<'info> {
    /// Pays for the token account when the player has never held rewards.
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

    /// Created empty if missing, so a player without rewards gets
    /// `InsufficientBalance` rather than an account error.
    #[account(
        init_if_needed,
        payer = player,
        associated_token::mint = reward_mint,
        associated_token::authority = player,
    )]
    pub player_token_account: Box<Account<'info, TokenAccount>>,

    #[account(mut, address = game_config.reward_mint)]
    pub reward_mint: Box<Account<'info, Mint>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Burn one reward token and restore full health.
pub fn handler(ctx: Context<Heal>) -> Result<()> {
    ctx.accounts.player_data.heal()?;

    let (cost, remaining_balance) = heal_charge(
        ctx.accounts.player_token_account.amount,
        ctx.accounts.reward_mint.decimals,
    )?;

    burn(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Burn {
                mint: ctx.accounts.reward_mint.to_account_info(),
                from: ctx.accounts.player_token_account.to_account_info(),
                authority: ctx.accounts.player.to_account_info(),
            },
        ),
        cost,
    )?;

    emit!(PlayerHealed {
        player: ctx.accounts.player.key(),
        burned: cost,
        remaining_balance,
    });

    msg!("Player {} healed, balance {}", ctx.accounts.player.key(), remaining_balance);
    Ok(())
}
