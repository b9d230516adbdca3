use anchor_lang::prelude::*;

#[event]
pub struct PlayerCreated {
    pub player: Pubkey,
    pub health: u8,
}

/// Emitted when a player asks the queue for randomness ("attack").
#[event]
pub struct AttackRequested {
    pub player: Pubkey,
    pub request: Pubkey,
    pub counter: u64,
}

/// Emitted when the oracle callback applies damage.
#[event]
pub struct DamageSettled {
    pub player: Pubkey,
    pub request: Pubkey,
    pub counter: u64,
    pub damage: u8,
    pub health: u8,
    pub reward: u64,
}

#[event]
pub struct PlayerHealed {
    pub player: Pubkey,
    pub burned: u64,
    pub remaining_balance: u64,
}

#[event]
pub struct RequestAbandoned {
    pub player: Pubkey,
    pub request: Pubkey,
}

#[event]
pub struct VaultDeposited {
    pub player: Pubkey,
    pub amount: u64,
    pub player_balance: u64,
    pub vault_balance: u64,
}

#[event]
pub struct VaultWithdrawn {
    pub player: Pubkey,
    pub amount: u64,
    pub player_balance: u64,
    pub vault_balance: u64,
}
