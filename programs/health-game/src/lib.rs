use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod settlement;
pub mod state;

use instructions::*;
use state::PlayerView;

declare_id!("7Q5b9aimnHmR8ooooRqxgfYfnLmPi6qrVR9GrJ1b6fDp");

/// Player health game settled by VRF callbacks.
///
/// Each player account holds `health` in `0..=100`. An "attack" asks the
/// `vrf_sol` queue for randomness and registers `consume_randomness` as the
/// only callback the oracle may invoke. The callback derives damage from the
/// output, lowers health, and mints reward tokens for the health lost.
/// Burning one token restores full health.
///
/// ## Flow
///
/// 1. **Request**: `request_randomness` CPIs into the queue, signed by the
///    player PDA; the player now has exactly one pending request.
/// 2. **Settle**: the oracle fulfills; the queue CPIs `consume_randomness`
///    in the same transaction, which settles damage and reward atomically.
/// 3. **Abandon**: if the oracle never answers, `abandon_request` times the
///    request out through the queue and frees the player.
#[program]
pub mod health_game {
    use super::*;

    /// Create the game configuration, the reward mint and its metadata.
    /// Only the program upgrade authority may call this.
    pub fn initialize(
        ctx: Context<Initialize>,
        uri: String,
        name: String,
        symbol: String,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, uri, name, symbol)
    }

    /// Create the caller's player account with full health.
    pub fn init_player(ctx: Context<InitPlayer>) -> Result<()> {
        instructions::init_player::handler(ctx)
    }

    /// Read a player's state without mutating anything.
    pub fn get_player(ctx: Context<GetPlayer>, owner: Pubkey) -> Result<PlayerView> {
        instructions::get_player::handler(ctx, owner)
    }

    /// Attack: request randomness that will settle as damage.
    pub fn request_randomness(ctx: Context<RequestRandomness>, seed: [u8; 32]) -> Result<()> {
        instructions::request_randomness::handler(ctx, seed)
    }

    /// Oracle callback. Only reachable through `vrf_sol::fulfill_randomness`.
    pub fn consume_randomness(
        ctx: Context<ConsumeRandomness>,
        counter: u64,
        randomness: [u8; 32],
    ) -> Result<()> {
        instructions::consume_randomness::handler(ctx, counter, randomness)
    }

    /// Burn one reward token to restore health to 100.
    pub fn heal(ctx: Context<Heal>) -> Result<()> {
        instructions::heal::handler(ctx)
    }

    /// Time out an unanswered request and clear the pending reference.
    pub fn abandon_request(ctx: Context<AbandonRequest>) -> Result<()> {
        instructions::abandon_request::handler(ctx)
    }

    /// Move reward tokens into the player's vault.
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Move reward tokens from the vault back to the player.
    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        instructions::withdraw::handler(ctx, amount)
    }
}
