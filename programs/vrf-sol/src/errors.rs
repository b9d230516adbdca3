use anchor_lang::prelude::*;

/// Error codes for the randomness queue program.
///
/// Anchor encodes these as `6000 + variant index` in on-chain error responses,
/// so new variants go at the end.
#[error_code]
pub enum VrfError {
    /// The request's status is not `Requested` (expected for cancellation).
    #[msg("Request is not in requested status")]
    RequestNotPending,
    /// The request is still awaiting fulfillment (expected to be settled for closure).
    #[msg("Request is still pending")]
    RequestStillPending,
    /// The Ed25519 instruction at index 0 could not be loaded or is malformed.
    #[msg("Invalid Ed25519 instruction")]
    InvalidEd25519Instruction,
    /// The instruction at index 0 does not target the native Ed25519 program.
    #[msg("Invalid Ed25519 program")]
    InvalidEd25519Program,
    /// Expected exactly one signature in the Ed25519 instruction.
    #[msg("Invalid signature count")]
    InvalidSignatureCount,
    /// The public key in the Ed25519 instruction does not match `config.authority`.
    #[msg("Invalid Ed25519 pubkey")]
    InvalidEd25519Pubkey,
    /// The signed message does not match `request || request_id || randomness`.
    #[msg("Invalid Ed25519 message")]
    InvalidEd25519Message,
    /// Ed25519 instruction offset indices must be self-referencing (0xFFFF).
    #[msg("Invalid Ed25519 instruction index references")]
    InvalidEd25519InstructionIndex,
    /// Signer does not have permission for this action (wrong admin, authority, or payer).
    #[msg("Unauthorized")]
    Unauthorized,
    /// A public key argument was the zero address (`11111111111111111111111111111111`).
    #[msg("Zero address not allowed")]
    ZeroAddressNotAllowed,
    /// The request counter would overflow u64 (practically unreachable).
    #[msg("Request counter overflow")]
    CounterOverflow,
    /// The queue is paused and does not accept new requests.
    #[msg("Randomness queue is unavailable")]
    QueueUnavailable,
    /// The payer cannot cover the request fee.
    #[msg("Insufficient funds to escrow the request fee")]
    InsufficientFunds,
    /// The callback names more accounts than `MAX_CALLBACK_ACCOUNTS`.
    #[msg("Too many callback accounts")]
    TooManyCallbackAccounts,
    /// The supplied callback program is not the one stored on the request.
    #[msg("Callback program does not match the request")]
    InvalidCallbackProgram,
    /// The fulfillment's remaining accounts differ from the stored callback list.
    #[msg("Callback accounts do not match the request")]
    CallbackAccountsMismatch,
    /// The request was already fulfilled; a result is delivered at most once.
    #[msg("Request has already been fulfilled")]
    AlreadyFulfilled,
    /// The `request_id` argument does not match the counter stored on the request.
    #[msg("Result sequence number does not match the request counter")]
    SequenceMismatch,
    /// The request has not been outstanding for `request_timeout_slots` yet.
    #[msg("Request has not timed out yet")]
    RequestNotExpired,
    /// Checked lamport or slot arithmetic overflowed.
    #[msg("Math overflow")]
    MathOverflow,
    /// The request timed out and no longer accepts a result.
    #[msg("Request has timed out")]
    StaleRequest,
}
