//! Deterministic VRF output computation.
//!
//! Uses HMAC-SHA256 keyed by the oracle's secret to produce a 32-byte
//! pseudo-random output that is deterministic (same inputs = same output)
//! but unpredictable without the secret key.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use solana_sdk::pubkey::Pubkey;

type HmacSha256 = Hmac<Sha256>;

/// Compute the 32-byte VRF output for a given randomness request.
///
/// ```text
/// output = HMAC-SHA256(secret, request || seed || request_slot_le || request_id_le)
/// ```
///
/// `request` binds the output to one request account, the caller's `seed`
/// keeps the oracle from pre-computing, and `request_slot`/`request_id` tie it
/// to the on-chain state at request time.
pub fn compute_randomness(
    hmac_secret: &[u8],
    request: &Pubkey,
    seed: &[u8; 32],
    request_slot: u64,
    request_id: u64,
) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(hmac_secret).expect("HMAC accepts keys of any size");

    mac.update(request.as_ref());
    mac.update(seed);
    mac.update(&request_slot.to_le_bytes());
    mac.update(&request_id.to_le_bytes());

    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

/// The message the on-chain program expects the authority to have signed:
/// `request (32) || request_id (8 LE) || randomness (32)`.
pub fn fulfillment_message(request: &Pubkey, request_id: u64, randomness: &[u8; 32]) -> Vec<u8> {
    let mut message = Vec::with_capacity(72);
    message.extend_from_slice(request.as_ref());
    message.extend_from_slice(&request_id.to_le_bytes());
    message.extend_from_slice(randomness);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn deterministic_for_same_inputs() {
        let request = Pubkey::new_unique();
        let seed = [1u8; 32];

        let r1 = compute_randomness(SECRET, &request, &seed, 100, 0);
        let r2 = compute_randomness(SECRET, &request, &seed, 100, 0);
        assert_eq!(r1, r2);
    }

    #[test]
    fn different_for_different_slots() {
        let request = Pubkey::new_unique();
        let seed = [1u8; 32];

        let r1 = compute_randomness(SECRET, &request, &seed, 100, 0);
        let r2 = compute_randomness(SECRET, &request, &seed, 101, 0);
        assert_ne!(r1, r2);
    }

    #[test]
    fn different_for_different_requests() {
        let seed = [1u8; 32];

        let r1 = compute_randomness(SECRET, &Pubkey::new_unique(), &seed, 100, 7);
        let r2 = compute_randomness(SECRET, &Pubkey::new_unique(), &seed, 100, 7);
        assert_ne!(r1, r2);
    }

    #[test]
    fn different_secret_different_output() {
        let request = Pubkey::new_unique();
        let seed = [1u8; 32];

        let r1 = compute_randomness(SECRET, &request, &seed, 100, 0);
        let r2 = compute_randomness(b"other-secret", &request, &seed, 100, 0);
        assert_ne!(r1, r2);
    }

    #[test]
    fn message_layout() {
        let request = Pubkey::new_unique();
        let message = fulfillment_message(&request, 0x0102, &[9u8; 32]);

        assert_eq!(message.len(), 72);
        assert_eq!(&message[..32], request.as_ref());
        assert_eq!(&message[32..40], &[2, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&message[40..], &[9u8; 32]);
    }
}
