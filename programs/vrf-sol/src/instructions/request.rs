use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::errors::VrfError;
use crate::events::RandomnessRequested;
use crate::state::{Callback, RandomnessRequest, VrfConfiguration};

/// Accounts required to create a new randomness request.
///
/// The request PDA is derived from the owning `authority` and a single-use
/// `seed`, so a consumer account can only ever be bound to requests it signed
/// for, and a seed can never be reused.
#[derive(Accounts)]
#[instruction(seed: [u8; 32])]
pub struct RequestRandomness<'info> {
    /// Wallet paying rent and the escrowed fee.
    #[account(mut)]
    pub payer: Signer<'info>,

    /// Consumer account that owns the request. Programs sign for their PDA
    /// with `invoke_signed`.
    pub authority: Signer<'info>,

    /// VRF configuration PDA (mutated to increment `request_counter`).
    #[account(
        mut,
        seeds = [b"vrf-config"],
        bump = config.bump,
    )]
    pub config: Account<'info, VrfConfiguration>,

    /// New request PDA. Seeds: `["request", authority, seed]`.
    #[account(
        init,
        payer = payer,
        space = 8 + RandomnessRequest::INIT_SPACE,
        seeds = [b"request", authority.key().as_ref(), seed.as_ref()],
        bump,
    )]
    pub request: Account<'info, RandomnessRequest>,

    pub system_program: Program<'info, System>,
}

/// Create a new randomness request.
///
/// 1. Rejects the request if the queue is paused or the callback is malformed.
/// 2. Moves `config.fee` lamports from `payer` into the request account (escrow).
/// 3. Initializes the request with status `Requested` and the stored callback.
/// 4. Increments `config.request_counter` and emits [`RandomnessRequested`].
pub fn handler(ctx: Context<RequestRandomness>, seed: [u8; 32], callback: Callback) -> Result<()> {
    let config = &mut ctx.accounts.config;
    require!(!config.paused, VrfError::QueueUnavailable);
    callback.validate()?;

    let request_id = config.request_counter;
    let fee = config.fee;

    if fee > 0 {
        require!(
            ctx.accounts.payer.lamports() >= fee,
            VrfError::InsufficientFunds
        );
        system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.payer.to_account_info(),
                    to: ctx.accounts.request.to_account_info(),
                },
            ),
            fee,
        )?;
    }

    let request = &mut ctx.accounts.request;
    request.request_id = request_id;
    request.authority = ctx.accounts.authority.key();
    request.payer = ctx.accounts.payer.key();
    request.seed = seed;
    request.request_slot = Clock::get()?.slot;
    request.status = RandomnessRequest::STATUS_REQUESTED;
    request.escrow = fee;
    request.randomness = [0u8; 32];
    request.fulfilled_slot = 0;
    request.bump = ctx.bumps.request;
    request.callback = callback;

    config.request_counter = config
        .request_counter
        .checked_add(1)
        .ok_or(VrfError::CounterOverflow)?;

    emit!(RandomnessRequested {
        request_id,
        request: request.key(),
        authority: request.authority,
        seed,
        request_slot: request.request_slot,
        callback_program: request.callback.program_id,
    });

    Ok(())
}
