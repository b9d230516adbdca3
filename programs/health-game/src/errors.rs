use anchor_lang::prelude::*;

/// Error codes for the health game.
///
/// Each precondition has its own variant so a client can tell "wait for the
/// pending request" apart from "top up your wallet".
#[error_code]
#[derive(Eq, PartialEq)]
pub enum GameError {
    #[msg("Player account already exists")]
    AlreadyExists,
    #[msg("Player account not found")]
    NotFound,
    #[msg("A randomness request is already pending for this player")]
    RequestAlreadyPending,
    #[msg("Insufficient funds to escrow the oracle fee")]
    InsufficientFunds,
    #[msg("Insufficient reward token balance")]
    InsufficientBalance,
    #[msg("Callback was not invoked by the randomness queue for this player")]
    Unauthorized,
    #[msg("Request is not the player's pending request")]
    StaleRequest,
    #[msg("Result sequence number does not match the request counter")]
    SequenceMismatch,
    #[msg("Request has already been settled")]
    AlreadyFulfilled,
    #[msg("Randomness queue is unavailable, retry in a new transaction")]
    QueueUnavailable,
    #[msg("No matching pending request")]
    NoPendingRequest,
    #[msg("Amount must be greater than zero")]
    InvalidAmount,
    #[msg("Math overflow")]
    MathOverflow,
}
