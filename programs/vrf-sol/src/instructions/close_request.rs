use anchor_lang::prelude::*;

use crate::errors::VrfError;
use crate::events::RequestClosed;
use crate::state::RandomnessRequest;

/// Accounts required to close a settled request and reclaim rent.
///
/// Only the original payer may close the account, and only once the request
/// is no longer `Requested` (fulfilled or timed out).
#[derive(Accounts)]
pub struct CloseRequest<'info> {
    /// The original payer; receives reclaimed rent.
    #[account(mut)]
    pub payer: Signer<'info>,

    /// The settled request PDA to close. Anchor's `close` directive
    /// zeroes the account data and transfers lamports to `payer`.
    #[account(
        mut,
        seeds = [b"request", request.authority.as_ref(), request.seed.as_ref()],
        bump = request.bump,
        constraint = request.payer == payer.key() @ VrfError::Unauthorized,
        constraint = !request.is_requested() @ VrfError::RequestStillPending,
        close = payer,
    )]
    pub request: Account<'info, RandomnessRequest>,
}

/// Close a settled request account. Emits [`RequestClosed`].
pub fn handler(ctx: Context<CloseRequest>) -> Result<()> {
    emit!(RequestClosed {
        request_id: ctx.accounts.request.request_id,
        payer: ctx.accounts.payer.key(),
    });

    Ok(())
}
