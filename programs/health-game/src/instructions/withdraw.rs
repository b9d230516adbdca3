use anchor_lang::prelude::*;
use anchor_spl::token::{transfer_checked, Mint, Token, TokenAccount, TransferChecked};

use crate::constants::{GAME_CONFIG_SEED, PLAYER_SEED, VAULT_SEED};
use crate::events::VaultWithdrawn;
use crate::ledger::move_balance;
use crate::state::{GameConfig, PlayerAccount};

#[derive(Accounts)]
pub struct Withdraw<'info> {
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

    #[account(
        mut,
        seeds = [VAULT_SEED, player_data.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = player_data,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(address = game_config.reward_mint)]
    pub reward_mint: Box<Account<'info, Mint>>,

    pub token_program: Program<'info, Token>,
}

/// Move tokens back from the vault; the player PDA signs as vault authority.
pub fn handler(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
    let (vault_balance, player_balance) = move_balance(
        ctx.accounts.vault.amount,
        ctx.accounts.player_token_account.amount,
        amount,
    )?;

    let owner = ctx.accounts.player.key();
    let player_bump = ctx.accounts.player_data.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[PLAYER_SEED, owner.as_ref(), &[player_bump]]];

    transfer_checked(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.vault.to_account_info(),
                mint: ctx.accounts.reward_mint.to_account_info(),
                to: ctx.accounts.player_token_account.to_account_info(),
                authority: ctx.accounts.player_data.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
        ctx.accounts.reward_mint.decimals,
    )?;

    emit!(VaultWithdrawn {
        player: owner,
        amount,
        player_balance,
        vault_balance,
    });

    Ok(())
}
