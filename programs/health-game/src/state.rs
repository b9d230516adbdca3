use anchor_lang::prelude::*;
use vrf_sol::state::{RandomnessRequest, VrfConfiguration};

use crate::constants::MAX_HEALTH;
use crate::errors::GameError;
use crate::ledger::escrow_requirement;
use crate::settlement::Settlement;

/// Game-wide configuration, stored as a singleton PDA.
///
/// Seeds: `["game-config"]`
///
/// Every instruction that touches the reward mint or the randomness queue
/// resolves those addresses through this account.
#[account]
#[derive(InitSpace)]
pub struct GameConfig {
    /// Upgrade authority of this program at genesis.
    pub admin: Pubkey,
    /// Reward mint PDA (`["reward"]`), its own mint authority.
    pub reward_mint: Pubkey,
    pub mint_bump: u8,
    /// `vrf_sol` configuration PDA; the only signer accepted on callbacks.
    pub vrf_config: Pubkey,
    pub bump: u8,
}

/// Per-player record.
///
/// Seeds: `["player", owner]`
///
/// `pending_request` is `Some` for exactly as long as a request is in flight;
/// while it is set the only path that changes `health` is the oracle callback.
#[account]
#[derive(InitSpace)]
pub struct PlayerAccount {
    pub owner: Pubkey,
    pub health: u8,
    pub pending_request: Option<Pubkey>,
    /// Counter the queue assigned to `pending_request`.
    pub pending_counter: u64,
    pub last_settled_request: Pubkey,
    pub requests_settled: u64,
    pub bump: u8,
}

/// Read-only snapshot returned by `get_player`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlayerView {
    pub owner: Pubkey,
    pub health: u8,
    pub pending_request: Option<Pubkey>,
    pub pending_counter: u64,
    pub requests_settled: u64,
}

impl GameConfig {
    /// Genesis is reserved for the program's upgrade authority; an immutable
    /// deployment has none and cannot be initialized by anyone.
    pub fn authorize_genesis(upgrade_authority: Option<Pubkey>, admin: &Pubkey) -> Result<()> {
        require!(
            upgrade_authority == Some(*admin),
            GameError::Unauthorized
        );
        Ok(())
    }

    /// Checks that a callback came through queue fulfillment for a request
    /// owned by `player_data` and addressed to this program.
    ///
    /// Only the queue program can make its configuration PDA sign, so
    /// `vrf_authority` signing proves the call was not made directly.
    pub fn authorize_callback(
        &self,
        vrf_authority: &Pubkey,
        vrf_authority_signed: bool,
        player_data: &Pubkey,
        request: &RandomnessRequest,
    ) -> Result<()> {
        require_keys_eq!(*vrf_authority, self.vrf_config, GameError::Unauthorized);
        require!(vrf_authority_signed, GameError::Unauthorized);
        require_keys_eq!(request.authority, *player_data, GameError::Unauthorized);
        require_keys_eq!(request.callback.program_id, crate::ID, GameError::Unauthorized);
        Ok(())
    }
}

impl PlayerAccount {
    pub fn initialize(&mut self, owner: Pubkey, bump: u8) -> Result<()> {
        require!(self.owner == Pubkey::default(), GameError::AlreadyExists);

        self.owner = owner;
        self.health = MAX_HEALTH;
        self.pending_request = None;
        self.pending_counter = 0;
        self.last_settled_request = Pubkey::default();
        self.requests_settled = 0;
        self.bump = bump;
        Ok(())
    }

    /// Marks `request` pending under the queue's next counter value.
    ///
    /// `wallet_lamports` must cover the queue fee plus `request_rent`, the
    /// rent-exempt minimum of the request account the queue creates.
    pub fn begin_request(
        &mut self,
        request: Pubkey,
        queue: &VrfConfiguration,
        wallet_lamports: u64,
        request_rent: u64,
    ) -> Result<()> {
        require!(
            self.pending_request.is_none(),
            GameError::RequestAlreadyPending
        );
        require!(!queue.paused, GameError::QueueUnavailable);
        require!(
            wallet_lamports >= escrow_requirement(queue.fee, request_rent)?,
            GameError::InsufficientFunds
        );
        self.pending_request = Some(request);
        self.pending_counter = queue.request_counter;
        Ok(())
    }

    /// Checks a callback delivering the result of `request` (at address
    /// `request_key`) under sequence number `counter`.
    ///
    /// A request the queue marks fulfilled, or one this player already
    /// settled, is `AlreadyFulfilled` regardless of how long ago it was.
    pub fn check_callback(
        &self,
        request_key: &Pubkey,
        request: &RandomnessRequest,
        counter: u64,
    ) -> Result<()> {
        require!(
            request.status != RandomnessRequest::STATUS_FULFILLED
                && self.last_settled_request != *request_key,
            GameError::AlreadyFulfilled
        );
        require!(
            request.is_requested() && self.pending_request == Some(*request_key),
            GameError::StaleRequest
        );
        require!(
            counter == self.pending_counter && counter == request.request_id,
            GameError::SequenceMismatch
        );
        Ok(())
    }

    pub fn settle(&mut self, request: Pubkey, settlement: &Settlement) {
        self.health = settlement.new_health;
        self.pending_request = None;
        self.last_settled_request = request;
        self.requests_settled = self.requests_settled.saturating_add(1);
    }

    pub fn heal(&mut self) -> Result<()> {
        require!(
            self.pending_request.is_none(),
            GameError::RequestAlreadyPending
        );
        self.health = MAX_HEALTH;
        Ok(())
    }

    /// Drops the pending reference after the queue timed the request out.
    pub fn abandon(&mut self, request: &Pubkey) -> Result<()> {
        require!(
            self.pending_request == Some(*request),
            GameError::NoPendingRequest
        );
        self.pending_request = None;
        Ok(())
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            owner: self.owner,
            health: self.health,
            pending_request: self.pending_request,
            pending_counter: self.pending_counter,
            requests_settled: self.requests_settled,
        }
    }
}
