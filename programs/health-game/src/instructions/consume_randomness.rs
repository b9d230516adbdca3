use anchor_lang::prelude::*;
use anchor_spl::token::{mint_to, Mint, MintTo, Token, TokenAccount};
use vrf_sol::state::RandomnessRequest;

use crate::constants::{GAME_CONFIG_SEED, PLAYER_SEED, REWARD_MINT_SEED};
use crate::events::DamageSettled;
use crate::settlement::{token_unit, Settlement};
use crate::state::{GameConfig, PlayerAccount};

/// Callback accounts, in the order the queue invokes them:
/// `[config (signer), request]` followed by the list stored at request time.
///
/// The player's token account is created by `request_randomness` but stays
/// under the player's control. If they close it while the request is pending,
/// every fulfillment fails account validation; the callback has no wallet
/// that could pay to re-create it. The request then stays open until the
/// queue timeout, after which `abandon_request` frees the player.
#[derive(Accounts)]
pub struct ConsumeRandomness<'info> {
    /// CHECK: The queue configuration PDA, checked against `game_config`
    /// together with its signature in [`GameConfig::authorize_callback`].
    pub vrf_authority: UncheckedAccount<'info>,

    /// Deserialized as the queue's account type, which also checks it is
    /// owned by the queue program.
    pub vrf_request: Box<Account<'info, RandomnessRequest>>,

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

    /// CHECK: Bound to `player_data` by its seeds.
    pub player: UncheckedAccount<'info>,

    #[account(
        mut,
        associated_token::mint = reward_mint,
        associated_token::authority = player,
    )]
    pub player_token_account: Box<Account<'info, TokenAccount>>,

    #[account(mut, address = game_config.reward_mint)]
    pub reward_mint: Box<Account<'info, Mint>>,

    pub token_program: Program<'info, Token>,
}

/// Apply one oracle result: damage, reward mint and clearing the pending
/// request all commit in the fulfillment transaction or not at all.
pub fn handler(ctx: Context<ConsumeRandomness>, counter: u64, randomness: [u8; 32]) -> Result<()> {
    ctx.accounts.game_config.authorize_callback(
        &ctx.accounts.vrf_authority.key(),
        ctx.accounts.vrf_authority.is_signer,
        &ctx.accounts.player_data.key(),
        &ctx.accounts.vrf_request,
    )?;

    // The queue writes `Fulfilled` on its own exit, so during this call the
    // request still reads `Requested`.
    let request_key = ctx.accounts.vrf_request.key();
    ctx.accounts
        .player_data
        .check_callback(&request_key, &ctx.accounts.vrf_request, counter)?;

    let unit = token_unit(ctx.accounts.reward_mint.decimals)?;
    let settlement = Settlement::compute(ctx.accounts.player_data.health, &randomness, unit)?;

    if settlement.reward > 0 {
        let mint_bump = ctx.accounts.game_config.mint_bump;
        let signer_seeds: &[&[&[u8]]] = &[&[REWARD_MINT_SEED, &[mint_bump]]];
        mint_to(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                MintTo {
                    mint: ctx.accounts.reward_mint.to_account_info(),
                    to: ctx.accounts.player_token_account.to_account_info(),
                    authority: ctx.accounts.reward_mint.to_account_info(),
                },
                signer_seeds,
            ),
            settlement.reward,
        )?;
    }

    ctx.accounts.player_data.settle(request_key, &settlement);

    emit!(DamageSettled {
        player: ctx.accounts.player.key(),
        request: request_key,
        counter,
        damage: settlement.damage,
        health: settlement.new_health,
        reward: settlement.reward,
    });

    msg!(
        "Damage {} settled: health {} -> {}, reward={}",
        settlement.damage,
        settlement.previous_health,
        settlement.new_health,
        settlement.reward
    );
    Ok(())
}
