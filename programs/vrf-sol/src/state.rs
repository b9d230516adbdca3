use anchor_lang::prelude::*;

use crate::errors::VrfError;

/// Upper bound on the number of accounts a stored callback may name.
pub const MAX_CALLBACK_ACCOUNTS: usize = 8;

/// Queue configuration, stored as a singleton PDA.
///
/// Seeds: `["vrf-config"]`
///
/// Only the `admin` may update this account via [`update_config`]. The
/// `authority` is the off-chain oracle key that signs fulfillment proofs, and
/// the PDA itself is the signer every callback receives.
#[account]
#[derive(InitSpace)]
pub struct VrfConfiguration {
    /// Privileged key that may update this configuration.
    pub admin: Pubkey,
    /// Ed25519 public key of the off-chain oracle that signs VRF proofs.
    pub authority: Pubkey,
    /// Account that receives the escrowed fee when a request is fulfilled.
    pub treasury: Pubkey,
    /// Fee in lamports escrowed per request.
    pub fee: u64,
    /// Monotonically increasing counter assigned to each new request.
    pub request_counter: u64,
    /// Slots after `request_slot` before an unfulfilled request may be cancelled.
    pub request_timeout_slots: u64,
    /// When set, new requests are rejected with `QueueUnavailable`.
    pub paused: bool,
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
}

/// One entry of a stored callback account list.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub struct CallbackAccount {
    pub pubkey: Pubkey,
    pub is_writable: bool,
}

/// The entry point and fixed account list the oracle may invoke on fulfillment.
///
/// The queue always prepends `[config (signer), request]` to `accounts` when it
/// builds the callback instruction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct Callback {
    /// Program that receives the callback CPI.
    pub program_id: Pubkey,
    /// Anchor instruction discriminator of the callback entry point.
    pub discriminator: [u8; 8],
    /// Ordered accounts appended after the queue-supplied ones.
    #[max_len(8)]
    pub accounts: Vec<CallbackAccount>,
}

impl Callback {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.program_id != Pubkey::default(),
            VrfError::ZeroAddressNotAllowed
        );
        require!(
            self.accounts.len() <= MAX_CALLBACK_ACCOUNTS,
            VrfError::TooManyCallbackAccounts
        );
        Ok(())
    }

    /// Check that `supplied` (key, writable) pairs are exactly the stored list.
    ///
    /// A supplied account may not be writable where the stored entry is
    /// read-only, and vice versa.
    pub fn verify_accounts<I>(&self, supplied: I) -> Result<()>
    where
        I: ExactSizeIterator<Item = (Pubkey, bool)>,
    {
        require!(
            supplied.len() == self.accounts.len(),
            VrfError::CallbackAccountsMismatch
        );
        for (expected, (key, is_writable)) in self.accounts.iter().zip(supplied) {
            require!(
                expected.pubkey == key && expected.is_writable == is_writable,
                VrfError::CallbackAccountsMismatch
            );
        }
        Ok(())
    }

    /// Instruction data: `discriminator || request_id (8 LE) || randomness (32)`.
    pub fn instruction_data(&self, request_id: u64, randomness: &[u8; 32]) -> Vec<u8> {
        let mut data = Vec::with_capacity(8 + 8 + 32);
        data.extend_from_slice(&self.discriminator);
        data.extend_from_slice(&request_id.to_le_bytes());
        data.extend_from_slice(randomness);
        data
    }
}

/// Individual randomness request account, one per request.
///
/// Seeds: `["request", authority, seed]`
///
/// The fixed-size fields come first so the oracle can filter on `status` at a
/// constant offset (120, discriminator included).
///
/// Lifecycle: Requested -> Fulfilled, or Requested -> TimedOut via
/// [`cancel_request`]. Closed by the payer once it leaves `Requested`.
#[account]
#[derive(InitSpace)]
pub struct RandomnessRequest {
    /// Counter value assigned by the queue at creation time.
    pub request_id: u64,
    /// Consumer account (usually a PDA) that owns the request.
    pub authority: Pubkey,
    /// Wallet that funded rent and escrow; receives refunds.
    pub payer: Pubkey,
    /// Single-use key mixed into the address and the VRF input.
    pub seed: [u8; 32],
    /// Solana slot at which the request was created.
    pub request_slot: u64,
    /// Request lifecycle status. See `STATUS_*` constants.
    pub status: u8,
    /// Lamports held in this account on top of rent to pay the oracle fee.
    pub escrow: u64,
    /// The 32-byte VRF output written by the oracle during fulfillment.
    pub randomness: [u8; 32],
    /// Solana slot at which the oracle fulfilled this request.
    pub fulfilled_slot: u64,
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
    /// Capability the oracle must honour when delivering the result.
    pub callback: Callback,
}

impl RandomnessRequest {
    /// Request created, awaiting oracle fulfillment.
    pub const STATUS_REQUESTED: u8 = 0;
    /// Oracle has fulfilled and the callback has been delivered.
    pub const STATUS_FULFILLED: u8 = 1;
    /// No result arrived within the timeout; escrow refunded.
    pub const STATUS_TIMED_OUT: u8 = 2;

    pub fn is_requested(&self) -> bool {
        self.status == Self::STATUS_REQUESTED
    }

    /// Checks that a result carrying `request_id` may be delivered now.
    ///
    /// A second delivery is `AlreadyFulfilled`, a delivery after the timeout
    /// is `StaleRequest`, and a result for another counter value is
    /// `SequenceMismatch`.
    pub fn check_fulfillable(&self, request_id: u64) -> Result<()> {
        match self.status {
            Self::STATUS_REQUESTED => {}
            Self::STATUS_FULFILLED => return err!(VrfError::AlreadyFulfilled),
            Self::STATUS_TIMED_OUT => return err!(VrfError::StaleRequest),
            _ => return err!(VrfError::RequestNotPending),
        }
        require!(
            self.request_id == request_id,
            VrfError::SequenceMismatch
        );
        Ok(())
    }

    /// First slot at which the request may be cancelled.
    pub fn expiry_slot(&self, timeout_slots: u64) -> Result<u64> {
        self.request_slot
            .checked_add(timeout_slots)
            .ok_or_else(|| error!(VrfError::MathOverflow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback(keys: &[(Pubkey, bool)]) -> Callback {
        Callback {
            program_id: Pubkey::new_unique(),
            discriminator: [7u8; 8],
            accounts: keys
                .iter()
                .map(|&(pubkey, is_writable)| CallbackAccount { pubkey, is_writable })
                .collect(),
        }
    }

    #[test]
    fn matching_accounts_pass() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let cb = callback(&[(a, false), (b, true)]);
        assert!(cb.verify_accounts(vec![(a, false), (b, true)].into_iter()).is_ok());
    }

    #[test]
    fn reordered_accounts_are_rejected() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let cb = callback(&[(a, true), (b, true)]);
        let err = cb
            .verify_accounts(vec![(b, true), (a, true)].into_iter())
            .unwrap_err();
        assert_eq!(err, VrfError::CallbackAccountsMismatch.into());
    }

    #[test]
    fn writability_must_match() {
        let a = Pubkey::new_unique();
        let cb = callback(&[(a, false)]);
        let err = cb.verify_accounts(vec![(a, true)].into_iter()).unwrap_err();
        assert_eq!(err, VrfError::CallbackAccountsMismatch.into());
    }

    #[test]
    fn extra_or_missing_accounts_are_rejected() {
        let a = Pubkey::new_unique();
        let cb = callback(&[(a, false)]);
        assert!(cb.verify_accounts(Vec::new().into_iter()).is_err());
        assert!(cb
            .verify_accounts(vec![(a, false), (Pubkey::new_unique(), false)].into_iter())
            .is_err());
    }

    #[test]
    fn validate_rejects_default_program_and_long_lists() {
        let mut cb = callback(&[]);
        cb.program_id = Pubkey::default();
        assert_eq!(cb.validate().unwrap_err(), VrfError::ZeroAddressNotAllowed.into());

        let keys: Vec<(Pubkey, bool)> = (0..=MAX_CALLBACK_ACCOUNTS)
            .map(|_| (Pubkey::new_unique(), false))
            .collect();
        let cb = callback(&keys);
        assert_eq!(cb.validate().unwrap_err(), VrfError::TooManyCallbackAccounts.into());
    }

    #[test]
    fn instruction_data_layout() {
        let cb = callback(&[]);
        let data = cb.instruction_data(42, &[9u8; 32]);
        assert_eq!(data.len(), 48);
        assert_eq!(&data[..8], &[7u8; 8]);
        assert_eq!(u64::from_le_bytes(data[8..16].try_into().unwrap()), 42);
        assert_eq!(&data[16..], &[9u8; 32]);
    }

    fn request(request_id: u64, status: u8) -> RandomnessRequest {
        RandomnessRequest {
            request_id,
            authority: Pubkey::new_unique(),
            payer: Pubkey::new_unique(),
            seed: [0u8; 32],
            request_slot: 1_000,
            status,
            escrow: 0,
            randomness: [0u8; 32],
            fulfilled_slot: 0,
            bump: 255,
            callback: callback(&[]),
        }
    }

    #[test]
    fn pending_request_with_matching_id_is_fulfillable() {
        let pending = request(12, RandomnessRequest::STATUS_REQUESTED);
        assert!(pending.check_fulfillable(12).is_ok());
    }

    #[test]
    fn second_delivery_is_already_fulfilled() {
        let mut delivered = request(3, RandomnessRequest::STATUS_REQUESTED);
        delivered.check_fulfillable(3).unwrap();
        delivered.status = RandomnessRequest::STATUS_FULFILLED;

        assert_eq!(
            delivered.check_fulfillable(3).unwrap_err(),
            VrfError::AlreadyFulfilled.into()
        );
        // Status wins over the id, so a replay never reads as a sequence error.
        assert_eq!(
            delivered.check_fulfillable(4).unwrap_err(),
            VrfError::AlreadyFulfilled.into()
        );
    }

    #[test]
    fn timed_out_request_is_stale() {
        let expired = request(8, RandomnessRequest::STATUS_TIMED_OUT);
        assert_eq!(
            expired.check_fulfillable(8).unwrap_err(),
            VrfError::StaleRequest.into()
        );
    }

    #[test]
    fn wrong_counter_is_sequence_mismatch() {
        let pending = request(8, RandomnessRequest::STATUS_REQUESTED);
        assert_eq!(
            pending.check_fulfillable(7).unwrap_err(),
            VrfError::SequenceMismatch.into()
        );
    }

    #[test]
    fn expiry_is_request_slot_plus_timeout() {
        let request = request(0, RandomnessRequest::STATUS_REQUESTED);
        assert!(request.is_requested());
        assert_eq!(request.expiry_slot(150).unwrap(), 1_150);
        assert_eq!(
            request.expiry_slot(u64::MAX).unwrap_err(),
            VrfError::MathOverflow.into()
        );
    }
}
