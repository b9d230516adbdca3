use anchor_lang::prelude::*;

use crate::errors::VrfError;
use crate::events::RequestTimedOut;
use crate::state::{RandomnessRequest, VrfConfiguration};

/// Accounts required to cancel a request the oracle never fulfilled.
///
/// Only the request's authority may cancel, and only once the request has
/// been outstanding for `config.request_timeout_slots`.
#[derive(Accounts)]
pub struct CancelRequest<'info> {
    /// The account that owns the request (a consumer PDA signs via CPI).
    pub authority: Signer<'info>,

    /// Original payer; receives the refunded escrow.
    /// CHECK: Validated against `request.payer`.
    #[account(
        mut,
        constraint = payer.key() == request.payer @ VrfError::Unauthorized,
    )]
    pub payer: UncheckedAccount<'info>,

    #[account(
        seeds = [b"vrf-config"],
        bump = config.bump,
    )]
    pub config: Account<'info, VrfConfiguration>,

    /// The request to cancel. Must still be `Requested`.
    #[account(
        mut,
        seeds = [b"request", request.authority.as_ref(), request.seed.as_ref()],
        bump = request.bump,
        constraint = request.authority == authority.key() @ VrfError::Unauthorized,
        constraint = request.is_requested() @ VrfError::RequestNotPending,
    )]
    pub request: Account<'info, RandomnessRequest>,
}

/// Transition an expired request to `TimedOut` and refund its escrow.
pub fn handler(ctx: Context<CancelRequest>) -> Result<()> {
    let slot = Clock::get()?.slot;
    let expiry = ctx
        .accounts
        .request
        .expiry_slot(ctx.accounts.config.request_timeout_slots)?;
    require!(slot >= expiry, VrfError::RequestNotExpired);

    let refunded = ctx.accounts.request.escrow;
    if refunded > 0 {
        let request_info = ctx.accounts.request.to_account_info();
        let payer_info = ctx.accounts.payer.to_account_info();
        let remaining = request_info
            .lamports()
            .checked_sub(refunded)
            .ok_or(VrfError::MathOverflow)?;
        let credited = payer_info
            .lamports()
            .checked_add(refunded)
            .ok_or(VrfError::MathOverflow)?;
        **request_info.try_borrow_mut_lamports()? = remaining;
        **payer_info.try_borrow_mut_lamports()? = credited;
    }

    let request = &mut ctx.accounts.request;
    request.escrow = 0;
    request.status = RandomnessRequest::STATUS_TIMED_OUT;

    msg!(
        "Request {} timed out at slot {} (requested at {})",
        request.request_id,
        slot,
        request.request_slot
    );

    emit!(RequestTimedOut {
        request_id: request.request_id,
        request: request.key(),
        refunded,
    });

    Ok(())
}
