use anchor_lang::prelude::*;
use anchor_spl::metadata::mpl_token_metadata::accounts::Metadata as MetadataAccount;
use anchor_spl::metadata::mpl_token_metadata::types::DataV2;
use anchor_spl::metadata::{create_metadata_accounts_v3, CreateMetadataAccountsV3, Metadata};
use anchor_spl::token::{Mint, Token};
use vrf_sol::program::VrfSol;
use vrf_sol::state::VrfConfiguration;

use crate::constants::{GAME_CONFIG_SEED, REWARD_DECIMALS, REWARD_MINT_SEED, VRF_CONFIG_SEED};
use crate::errors::GameError;
use crate::program::HealthGame;
use crate::state::GameConfig;

/// Accounts for the one-time game genesis.
///
/// Only the program's upgrade authority may run it. The reward mint is a PDA
/// and its own mint authority, so only this program can ever mint or update
/// its metadata.
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Must be the upgrade authority recorded in `program_data`.
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        constraint = program.programdata_address()? == Some(program_data.key()) @ GameError::Unauthorized,
    )]
    pub program: Program<'info, HealthGame>,

    pub program_data: Box<Account<'info, ProgramData>>,

    #[account(
        init,
        payer = admin,
        space = 8 + GameConfig::INIT_SPACE,
        seeds = [GAME_CONFIG_SEED],
        bump,
    )]
    pub game_config: Box<Account<'info, GameConfig>>,

    #[account(
        init,
        payer = admin,
        seeds = [REWARD_MINT_SEED],
        bump,
        mint::decimals = REWARD_DECIMALS,
        mint::authority = reward_mint,
    )]
    pub reward_mint: Box<Account<'info, Mint>>,

    /// CHECK: Address is the Token Metadata PDA of `reward_mint`.
    #[account(
        mut,
        address = MetadataAccount::find_pda(&reward_mint.key()).0,
    )]
    pub metadata_account: UncheckedAccount<'info>,

    /// Queue configuration the game will accept callbacks from.
    #[account(
        seeds = [VRF_CONFIG_SEED],
        bump = vrf_config.bump,
        seeds::program = vrf_program.key(),
    )]
    pub vrf_config: Box<Account<'info, VrfConfiguration>>,

    pub vrf_program: Program<'info, VrfSol>,
    pub token_program: Program<'info, Token>,
    pub token_metadata_program: Program<'info, Metadata>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

pub fn handler(ctx: Context<Initialize>, uri: String, name: String, symbol: String) -> Result<()> {
    GameConfig::authorize_genesis(
        ctx.accounts.program_data.upgrade_authority_address,
        &ctx.accounts.admin.key(),
    )?;

    let mint_bump = ctx.bumps.reward_mint;
    let signer_seeds: &[&[&[u8]]] = &[&[REWARD_MINT_SEED, &[mint_bump]]];

    let data = DataV2 {
        name,
        symbol,
        uri,
        seller_fee_basis_points: 0,
        creators: None,
        collection: None,
        uses: None,
    };

    create_metadata_accounts_v3(
        CpiContext::new_with_signer(
            ctx.accounts.token_metadata_program.to_account_info(),
            CreateMetadataAccountsV3 {
                metadata: ctx.accounts.metadata_account.to_account_info(),
                mint: ctx.accounts.reward_mint.to_account_info(),
                mint_authority: ctx.accounts.reward_mint.to_account_info(),
                update_authority: ctx.accounts.reward_mint.to_account_info(),
                payer: ctx.accounts.admin.to_account_info(),
                system_program: ctx.accounts.system_program.to_account_info(),
                rent: ctx.accounts.rent.to_account_info(),
            },
            signer_seeds,
        ),
        data,
        true,
        true,
        None,
    )?;

    let config = &mut ctx.accounts.game_config;
    config.admin = ctx.accounts.admin.key();
    config.reward_mint = ctx.accounts.reward_mint.key();
    config.mint_bump = mint_bump;
    config.vrf_config = ctx.accounts.vrf_config.key();
    config.bump = ctx.bumps.game_config;

    msg!(
        "Game initialized: mint={}, vrf_config={}",
        config.reward_mint,
        config.vrf_config
    );

    Ok(())
}
