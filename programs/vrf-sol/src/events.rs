use anchor_lang::prelude::*;

/// Emitted when a new randomness request is created.
///
/// The off-chain oracle backend subscribes to these events via WebSocket log
/// monitoring and triggers fulfillment automatically.
#[event]
pub struct RandomnessRequested {
    pub request_id: u64,
    pub request: Pubkey,
    pub authority: Pubkey,
    pub seed: [u8; 32],
    pub request_slot: u64,
    pub callback_program: Pubkey,
}

/// Emitted when the oracle fulfills a request and the callback returned.
#[event]
pub struct RandomnessFulfilled {
    pub request_id: u64,
    pub request: Pubkey,
    pub randomness: [u8; 32],
    pub fee_paid: u64,
}

/// Emitted when an expired request is cancelled and its escrow refunded.
#[event]
pub struct RequestTimedOut {
    pub request_id: u64,
    pub request: Pubkey,
    pub refunded: u64,
}

/// Emitted when a settled request account is closed and rent reclaimed.
#[event]
pub struct RequestClosed {
    pub request_id: u64,
    pub payer: Pubkey,
}
