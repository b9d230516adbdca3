use anchor_lang::prelude::*;

pub mod ed25519;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;

use instructions::*;
use state::Callback;

declare_id!("A4pDDsKvtX2U3jyEURVSoH15Mx4JcgUiSqCKxqWE3N48");

/// Solana VRF (Verifiable Random Function) randomness queue.
///
/// Consumers register a request together with a *callback*: the program entry
/// point and the exact ordered account list the oracle is allowed to invoke.
/// An off-chain oracle watches for [`RandomnessRequested`] events, computes
/// HMAC-SHA256 randomness keyed by a secret, signs the output with its Ed25519
/// authority key, and submits a fulfillment transaction that the program
/// verifies on-chain via the native Ed25519 precompile before delivering the
/// result through the stored callback.
///
/// ## Request lifecycle
///
/// 1. **Request**: a consumer calls `request_randomness` with a single-use
///    seed; a PDA is created with status `Requested` and the fee is escrowed.
/// 2. **Fulfill**: the oracle submits `fulfill_randomness`; the callback runs
///    and the status transitions to `Fulfilled`, paying out the escrow.
/// 3. **Cancel**: if no result arrives within the timeout the authority may
///    call `cancel_request`; status transitions to `TimedOut`, escrow refunded.
/// 4. **Close**: the payer calls `close_request` to reclaim rent.
///
/// [`RandomnessRequested`]: crate::events::RandomnessRequested
#[program]
pub mod vrf_sol {
    use super::*;

    /// Create the singleton VRF configuration PDA.
    ///
    /// Must be called exactly once. Sets the admin, oracle authority, treasury,
    /// fee, and the timeout after which unfulfilled requests may be cancelled.
    pub fn initialize(ctx: Context<Initialize>, fee: u64, request_timeout_slots: u64) -> Result<()> {
        instructions::initialize::handler(ctx, fee, request_timeout_slots)
    }

    /// Update the VRF configuration (admin-only).
    ///
    /// Only provided fields are updated. Zero-address values are rejected.
    pub fn update_config(ctx: Context<UpdateConfig>, update: ConfigUpdate) -> Result<()> {
        instructions::update_config::handler(ctx, update)
    }

    /// Submit a new randomness request with its callback capability.
    ///
    /// Creates a request PDA, escrows the fee, and emits `RandomnessRequested`.
    pub fn request_randomness(
        ctx: Context<RequestRandomness>,
        seed: [u8; 32],
        callback: Callback,
    ) -> Result<()> {
        instructions::request::handler(ctx, seed, callback)
    }

    /// Fulfill a pending request with a VRF output and Ed25519 proof.
    ///
    /// Only callable by the configured `authority`. Requires a preceding Ed25519
    /// signature-verify instruction in the same transaction.
    pub fn fulfill_randomness<'info>(
        ctx: Context<'_, '_, '_, 'info, FulfillRandomness<'info>>,
        request_id: u64,
        randomness: [u8; 32],
    ) -> Result<()> {
        instructions::fulfill::handler(ctx, request_id, randomness)
    }

    /// Cancel a request that was not fulfilled within the timeout window.
    pub fn cancel_request(ctx: Context<CancelRequest>) -> Result<()> {
        instructions::cancel_request::handler(ctx)
    }

    /// Close a fulfilled or timed-out request and return rent to the payer.
    pub fn close_request(ctx: Context<CloseRequest>) -> Result<()> {
        instructions::close_request::handler(ctx)
    }
}
