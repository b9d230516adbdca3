use anchor_lang::prelude::*;
use anchor_spl::token::{transfer_checked, Mint, Token, TokenAccount, TransferChecked};

use crate::constants::{GAME_CONFIG_SEED, PLAYER_SEED, VAULT_SEED};
use crate::events::VaultDeposited;
use crate::ledger::move_balance;
use crate::state::{GameConfig, PlayerAccount};

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub player: Signer<'info>,

    #[account(
        seeds = [GAME_CONFIG_SEED],
        bump = game_config.bump,
    )]
    pub game_config: Box<Account<'info, GameConfig>>,

    #[account(
        seeds = [PLAYER_SEED, player.key().as_ref()],
        bump = player_data.bump,
    )]
    pub player_data: Account<'info, PlayerAccount>,

    #[account(
        mut,
        associated_token::mint = reward_mint,
        associated_token::authority = player,
    )]
    pub player_token_account: Box<Account<'info, TokenAccount>>,

    /// Per-player vault, owned by the player PDA.
    #[account(
        init_if_needed,
        payer = player,
        seeds = [VAULT_SEED, player_data.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = player_data,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(address = game_config.reward_mint)]
    pub reward_mint: Box<Account<'info, Mint>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    let (player_balance, vault_balance) = move_balance(
        ctx.accounts.player_token_account.amount,
        ctx.accounts.vault.amount,
        amount,
    )?;

    transfer_checked(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.player_token_account.to_account_info(),
                mint: ctx.accounts.reward_mint.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
                authority: ctx.accounts.player.to_account_info(),
            },
        ),
        amount,
        ctx.accounts.reward_mint.decimals,
    )?;

    emit!(VaultDeposited {
        player: ctx.accounts.player.key(),
        amount,
        player_balance,
        vault_balance,
    });

    Ok(())
}
