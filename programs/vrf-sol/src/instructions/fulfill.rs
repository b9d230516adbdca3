use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;

use crate::ed25519::{fulfillment_message, verify_ed25519_instruction};
use crate::errors::VrfError;
use crate::events::RandomnessFulfilled;
use crate::state::{RandomnessRequest, VrfConfiguration};

/// Accounts required to fulfill a pending randomness request.
///
/// The transaction **must** include a native Ed25519 signature-verify
/// instruction at index 0 that proves the `authority` signed
/// `request (32) || request_id (8 LE) || randomness (32)`.
///
/// `remaining_accounts` must be exactly the callback account list stored on
/// the request, in order and with the same writability.
#[derive(Accounts)]
pub struct FulfillRandomness<'info> {
    /// Oracle authority that signs fulfillment proofs. Must match `config.authority`.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// VRF configuration PDA; signs the callback CPI.
    #[account(
        seeds = [b"vrf-config"],
        bump = config.bump,
        constraint = config.authority == authority.key() @ VrfError::Unauthorized,
    )]
    pub config: Account<'info, VrfConfiguration>,

    /// The request to fulfill. Status and `request_id` are checked by
    /// [`RandomnessRequest::check_fulfillable`] in the handler.
    #[account(
        mut,
        seeds = [b"request", request.authority.as_ref(), request.seed.as_ref()],
        bump = request.bump,
    )]
    pub request: Account<'info, RandomnessRequest>,

    /// Fee recipient; must match `config.treasury`.
    /// CHECK: Validated by the constraint below.
    #[account(
        mut,
        constraint = treasury.key() == config.treasury @ VrfError::Unauthorized,
    )]
    pub treasury: UncheckedAccount<'info>,

    /// The program named by the stored callback.
    /// CHECK: Validated by matching `request.callback.program_id`.
    #[account(
        executable,
        constraint = callback_program.key() == request.callback.program_id @ VrfError::InvalidCallbackProgram,
    )]
    pub callback_program: UncheckedAccount<'info>,

    /// Native Instructions sysvar used to introspect the Ed25519 instruction.
    /// CHECK: Validated by the address constraint.
    #[account(address = sysvar_instructions::ID)]
    pub instructions_sysvar: UncheckedAccount<'info>,
    // remaining_accounts: the stored callback accounts
}

/// Fulfill a pending randomness request and deliver it to the callback.
///
/// 1. Rejects a request that is already fulfilled (`AlreadyFulfilled`),
///    timed out (`StaleRequest`) or carries another counter
///    (`SequenceMismatch`), then verifies the Ed25519 proof and the
///    supplied callback accounts.
/// 2. Marks the request `Fulfilled` and records the output.
/// 3. CPIs the stored entry point, signed by the configuration PDA.
/// 4. Drains the escrow to the treasury.
///
/// A callback that fails aborts the whole transaction with the callee's own
/// error, so the request stays `Requested` and the escrow untouched.
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, FulfillRandomness<'info>>,
    request_id: u64,
    randomness: [u8; 32],
) -> Result<()> {
    ctx.accounts.request.check_fulfillable(request_id)?;

    let request_key = ctx.accounts.request.key();
    verify_ed25519_instruction(
        &ctx.accounts.instructions_sysvar,
        &ctx.accounts.config.authority,
        &fulfillment_message(&request_key, request_id, &randomness),
    )?;

    let callback = ctx.accounts.request.callback.clone();
    callback.verify_accounts(
        ctx.remaining_accounts
            .iter()
            .map(|account| (account.key(), account.is_writable)),
    )?;

    let request = &mut ctx.accounts.request;
    request.randomness = randomness;
    request.status = RandomnessRequest::STATUS_FULFILLED;
    request.fulfilled_slot = Clock::get()?.slot;

    // The callback sees `[config (signer), request]` followed by the stored list.
    let mut accounts = Vec::with_capacity(2 + callback.accounts.len());
    accounts.push(AccountMeta::new_readonly(ctx.accounts.config.key(), true));
    accounts.push(AccountMeta::new_readonly(request_key, false));
    for account in &callback.accounts {
        if account.is_writable {
            accounts.push(AccountMeta::new(account.pubkey, false));
        } else {
            accounts.push(AccountMeta::new_readonly(account.pubkey, false));
        }
    }

    let callback_ix = Instruction {
        program_id: callback.program_id,
        accounts,
        data: callback.instruction_data(request_id, &randomness),
    };

    let mut account_infos = Vec::with_capacity(3 + ctx.remaining_accounts.len());
    account_infos.push(ctx.accounts.config.to_account_info());
    account_infos.push(ctx.accounts.request.to_account_info());
    account_infos.extend(ctx.remaining_accounts.iter().cloned());
    account_infos.push(ctx.accounts.callback_program.to_account_info());

    let config_bump = ctx.accounts.config.bump;
    let signer_seeds: &[&[u8]] = &[b"vrf-config", &[config_bump]];
    invoke_signed(&callback_ix, &account_infos, &[signer_seeds])?;

    // Release the escrow only once the callback has committed.
    let fee_paid = ctx.accounts.request.escrow;
    if fee_paid > 0 {
        let request_info = ctx.accounts.request.to_account_info();
        let treasury_info = ctx.accounts.treasury.to_account_info();
        let remaining = request_info
            .lamports()
            .checked_sub(fee_paid)
            .ok_or(VrfError::MathOverflow)?;
        let credited = treasury_info
            .lamports()
            .checked_add(fee_paid)
            .ok_or(VrfError::MathOverflow)?;
        **request_info.try_borrow_mut_lamports()? = remaining;
        **treasury_info.try_borrow_mut_lamports()? = credited;
    }
    ctx.accounts.request.escrow = 0;

    msg!(
        "Fulfilled request_id={} for {}, fee={}",
        request_id,
        ctx.accounts.request.authority,
        fee_paid
    );

    emit!(RandomnessFulfilled {
        request_id,
        request: request_key,
        randomness,
        fee_paid,
    });

    Ok(())
}
