use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;
use solana_sdk_ids::ed25519_program;

use crate::errors::VrfError;

/// Size of the Ed25519 instruction header: count, padding, 7 x u16 offsets.
const HEADER_LEN: usize = 16;

/// Marker for "data lives in this same instruction".
const SELF_INDEX: u16 = u16::MAX;

/// The message the oracle signs for a fulfillment:
/// `request (32) || request_id (8 LE) || randomness (32)`.
pub fn fulfillment_message(request: &Pubkey, request_id: u64, randomness: &[u8; 32]) -> Vec<u8> {
    let mut message = Vec::with_capacity(72);
    message.extend_from_slice(request.as_ref());
    message.extend_from_slice(&request_id.to_le_bytes());
    message.extend_from_slice(randomness);
    message
}

/// Introspect the Instructions sysvar to verify that instruction at index 0 is
/// a valid Ed25519 signature verification with the expected authority and message.
///
/// The precompile itself has already checked the signature by the time this
/// program runs; what remains is to make sure it checked the right key over
/// the right bytes.
pub fn verify_ed25519_instruction(
    instructions_sysvar: &UncheckedAccount,
    expected_pubkey: &Pubkey,
    expected_message: &[u8],
) -> Result<()> {
    let ix = sysvar_instructions::load_instruction_at_checked(
        0,
        &instructions_sysvar.to_account_info(),
    )
    .map_err(|_| VrfError::InvalidEd25519Instruction)?;

    require_keys_eq!(ix.program_id, ed25519_program::ID, VrfError::InvalidEd25519Program);

    check_ed25519_data(&ix.data, expected_pubkey, expected_message)
}

/// Validate the payload of an Ed25519 precompile instruction.
///
/// ## Layout
///
/// ```text
/// [0]       num_signatures (u8): must be 1
/// [1]       padding (u8)
/// [2..16]   Ed25519SignatureOffsets (7 x u16 LE):
///             signature_offset, signature_instruction_index,
///             public_key_offset, public_key_instruction_index,
///             message_data_offset, message_data_size,
///             message_instruction_index
/// [16..]    payload: public_key (32) + signature (64) + message (variable)
/// ```
pub fn check_ed25519_data(
    data: &[u8],
    expected_pubkey: &Pubkey,
    expected_message: &[u8],
) -> Result<()> {
    require!(data.len() >= HEADER_LEN, VrfError::InvalidEd25519Instruction);
    require!(data[0] == 1, VrfError::InvalidSignatureCount);

    let field = |i: usize| u16::from_le_bytes([data[2 + 2 * i], data[3 + 2 * i]]);
    let sig_ix_index = field(1);
    let pubkey_offset = field(2) as usize;
    let pubkey_ix_index = field(3);
    let msg_offset = field(4) as usize;
    let msg_size = field(5) as usize;
    let msg_ix_index = field(6);

    require!(
        sig_ix_index == SELF_INDEX && pubkey_ix_index == SELF_INDEX && msg_ix_index == SELF_INDEX,
        VrfError::InvalidEd25519InstructionIndex
    );

    let pubkey_bytes = data
        .get(pubkey_offset..pubkey_offset + 32)
        .ok_or(VrfError::InvalidEd25519Instruction)?;
    require!(
        pubkey_bytes == expected_pubkey.as_ref(),
        VrfError::InvalidEd25519Pubkey
    );

    let message = data
        .get(msg_offset..msg_offset + msg_size)
        .ok_or(VrfError::InvalidEd25519Instruction)?;
    require!(message == expected_message, VrfError::InvalidEd25519Message);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Same layout the oracle backend produces; the signature bytes are not
    /// inspected here.
    fn precompile_data(pubkey: &Pubkey, message: &[u8], index: u16) -> Vec<u8> {
        let pubkey_offset = HEADER_LEN as u16;
        let signature_offset = pubkey_offset + 32;
        let message_offset = signature_offset + 64;

        let mut data = vec![1u8, 0u8];
        for value in [
            signature_offset,
            index,
            pubkey_offset,
            index,
            message_offset,
            message.len() as u16,
            index,
        ] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(pubkey.as_ref());
        data.extend_from_slice(&[0u8; 64]);
        data.extend_from_slice(message);
        data
    }

    #[test]
    fn accepts_expected_key_and_message() {
        let authority = Pubkey::new_unique();
        let message = fulfillment_message(&Pubkey::new_unique(), 3, &[5u8; 32]);
        let data = precompile_data(&authority, &message, SELF_INDEX);
        assert!(check_ed25519_data(&data, &authority, &message).is_ok());
    }

    #[test]
    fn rejects_foreign_signer() {
        let message = fulfillment_message(&Pubkey::new_unique(), 3, &[5u8; 32]);
        let data = precompile_data(&Pubkey::new_unique(), &message, SELF_INDEX);
        let err = check_ed25519_data(&data, &Pubkey::new_unique(), &message).unwrap_err();
        assert_eq!(err, VrfError::InvalidEd25519Pubkey.into());
    }

    #[test]
    fn rejects_result_signed_for_another_request() {
        let authority = Pubkey::new_unique();
        let request = Pubkey::new_unique();
        let signed = fulfillment_message(&request, 3, &[5u8; 32]);
        let data = precompile_data(&authority, &signed, SELF_INDEX);

        let stale = fulfillment_message(&request, 2, &[5u8; 32]);
        let err = check_ed25519_data(&data, &authority, &stale).unwrap_err();
        assert_eq!(err, VrfError::InvalidEd25519Message.into());
    }

    #[test]
    fn rejects_cross_instruction_references() {
        let authority = Pubkey::new_unique();
        let message = fulfillment_message(&Pubkey::new_unique(), 0, &[1u8; 32]);
        let data = precompile_data(&authority, &message, 1);
        let err = check_ed25519_data(&data, &authority, &message).unwrap_err();
        assert_eq!(err, VrfError::InvalidEd25519InstructionIndex.into());
    }

    #[test]
    fn rejects_truncated_payload() {
        let authority = Pubkey::new_unique();
        let message = fulfillment_message(&Pubkey::new_unique(), 0, &[1u8; 32]);
        let mut data = precompile_data(&authority, &message, SELF_INDEX);
        data.truncate(data.len() - 1);
        let err = check_ed25519_data(&data, &authority, &message).unwrap_err();
        assert_eq!(err, VrfError::InvalidEd25519Instruction.into());

        assert!(check_ed25519_data(&[1u8; 4], &authority, &message).is_err());
    }
}
