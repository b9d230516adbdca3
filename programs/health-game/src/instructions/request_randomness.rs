use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};
use vrf_sol::program::VrfSol;
use vrf_sol::state::{Callback, CallbackAccount, RandomnessRequest, VrfConfiguration};

use crate::constants::{GAME_CONFIG_SEED, PLAYER_SEED};
use crate::events::AttackRequested;
use crate::state::{GameConfig, PlayerAccount};

/// Accounts for an "attack": a randomness request owned by the player PDA.
#[derive(Accounts)]
#[instruction(seed: [u8; 32])]
pub struct RequestRandomness<'info> {
    /// Player wallet; pays rent and the escrowed oracle fee.
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

    /// Created here so the callback always has somewhere to mint.
    #[account(
        init_if_needed,
        payer = player,
        associated_token::mint = reward_mint,
        associated_token::authority = player,
    )]
    pub player_token_account: Box<Account<'info, TokenAccount>>,

    #[account(address = game_config.reward_mint)]
    pub reward_mint: Box<Account<'info, Mint>>,

    /// Mutated by the queue CPI to bump `request_counter`.
    #[account(mut, address = game_config.vrf_config)]
    pub vrf_config: Box<Account<'info, VrfConfiguration>>,

    /// CHECK: Created and validated by the queue program during the CPI.
    #[account(mut)]
    pub vrf_request: UncheckedAccount<'info>,

    pub vrf_program: Program<'info, VrfSol>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<RequestRandomness>, seed: [u8; 32]) -> Result<()> {
    let counter = ctx.accounts.vrf_config.request_counter;
    let request_key = ctx.accounts.vrf_request.key();

    let request_rent = Rent::get()?.minimum_balance(8 + RandomnessRequest::INIT_SPACE);
    let wallet_lamports = ctx.accounts.player.lamports();
    ctx.accounts.player_data.begin_request(
        request_key,
        &ctx.accounts.vrf_config,
        wallet_lamports,
        request_rent,
    )?;

    let callback = settlement_callback(&ctx.accounts)?;

    let owner = ctx.accounts.player.key();
    let player_bump = ctx.accounts.player_data.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[PLAYER_SEED, owner.as_ref(), &[player_bump]]];

    let cpi_accounts = vrf_sol::cpi::accounts::RequestRandomness {
        payer: ctx.accounts.player.to_account_info(),
        authority: ctx.accounts.player_data.to_account_info(),
        config: ctx.accounts.vrf_config.to_account_info(),
        request: ctx.accounts.vrf_request.to_account_info(),
        system_program: ctx.accounts.system_program.to_account_info(),
    };
    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.vrf_program.to_account_info(),
        cpi_accounts,
        signer_seeds,
    );
    vrf_sol::cpi::request_randomness(cpi_ctx, seed, callback)?;

    emit!(AttackRequested {
        player: owner,
        request: request_key,
        counter,
    });

    msg!("Attack requested: request={}, counter={}", request_key, counter);
    Ok(())
}

/// The only entry point and account list the oracle may invoke for this
/// request. Order matches `ConsumeRandomness` after the two queue accounts.
fn settlement_callback(accounts: &RequestRandomness) -> Result<Callback> {
    let discriminator = <[u8; 8]>::try_from(crate::instruction::ConsumeRandomness::DISCRIMINATOR)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    let readonly = |pubkey: Pubkey| CallbackAccount {
        pubkey,
        is_writable: false,
    };
    let writable = |pubkey: Pubkey| CallbackAccount {
        pubkey,
        is_writable: true,
    };

    Ok(Callback {
        program_id: crate::ID,
        discriminator,
        accounts: vec![
            readonly(accounts.game_config.key()),
            writable(accounts.player_data.key()),
            readonly(accounts.player.key()),
            writable(accounts.player_token_account.key()),
            writable(accounts.reward_mint.key()),
            readonly(accounts.token_program.key()),
        ],
    })
}
