//! Fulfillment engine: consumes randomness request events and submits
//! on-chain fulfillment transactions with Ed25519 signature proofs.
//!
//! Each fulfillment transaction contains:
//! 1. A native Ed25519 signature-verify instruction (proof of VRF output).
//! 2. (Optional) A `set_compute_unit_price` instruction for priority fees.
//! 3. The `fulfill_randomness` instruction, which verifies the proof and
//!    invokes the callback stored on the request with its stored accounts.

use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::sysvar;
use solana_sdk::transaction::Transaction;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, instrument, warn};

use crate::accounts::{instruction_discriminator, QueueConfig, RequestAccount};
use crate::config::AppConfig;
use crate::listener::RandomnessRequestedEvent;
use crate::metrics::Metrics;
use crate::vrf::{compute_randomness, fulfillment_message};

/// `vrf_sol` error codes that will never succeed on retry.
const ERROR_REQUEST_NOT_PENDING: u32 = 6000;
const ERROR_UNAUTHORIZED: u32 = 6008;
const ERROR_ALREADY_FULFILLED: u32 = 6016;
const ERROR_SEQUENCE_MISMATCH: u32 = 6017;
const ERROR_STALE_REQUEST: u32 = 6020;

const NON_RETRYABLE_NAMES: [&str; 6] = [
    "RequestNotPending",
    "Unauthorized",
    "AlreadyFulfilled",
    "SequenceMismatch",
    "StaleRequest",
    "AccountNotInitialized",
];

const COMPUTE_BUDGET_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ComputeBudget111111111111111111111111111111");

/// Ed25519 instruction header: count, padding, 7 x u16 offsets.
const ED25519_HEADER_LEN: usize = 2 + 7 * 2;

/// Result of handling one request.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Fulfilled(String),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    /// Settled or cancelled before we got to it; carries the status byte.
    NotPending(u8),
    /// Calls back into a program outside `CALLBACK_PROGRAM_IDS`.
    UnservedCallback(Pubkey),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotPending(status) => write!(f, "request no longer pending (status {status})"),
            SkipReason::UnservedCallback(program) => write!(f, "callback program {program} is not served"),
        }
    }
}

/// Decide whether a freshly read request should be fulfilled by this oracle.
fn skip_reason(config: &AppConfig, request: &RequestAccount) -> Option<SkipReason> {
    if !request.is_requested() {
        return Some(SkipReason::NotPending(request.status));
    }
    if !config.serves(&request.callback_program) {
        return Some(SkipReason::UnservedCallback(request.callback_program));
    }
    None
}

/// Check if an error string contains a known non-retryable error.
fn is_non_retryable(err_str: &str) -> bool {
    let non_retryable_codes = [
        ERROR_REQUEST_NOT_PENDING,
        ERROR_UNAUTHORIZED,
        ERROR_ALREADY_FULFILLED,
        ERROR_SEQUENCE_MISMATCH,
        ERROR_STALE_REQUEST,
    ];
    non_retryable_codes
        .iter()
        .any(|code| err_str.contains(&format!("0x{code:x}")))
        || NON_RETRYABLE_NAMES.iter().any(|name| err_str.contains(name))
}

/// Main fulfiller loop.
///
/// Every event gets its own task; at most `fulfillment_concurrency` run at once.
pub async fn run_fulfiller(
    config: AppConfig,
    mut rx: mpsc::Receiver<RandomnessRequestedEvent>,
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
) {
    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));

    let semaphore = Arc::new(Semaphore::new(config.fulfillment_concurrency));

    while let Some(event) = rx.recv().await {
        metrics.record_request();
        pending_count.fetch_add(1, Ordering::Relaxed);

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                error!("Semaphore closed, stopping fulfiller");
                break;
            }
        };
        let rpc = rpc_client.clone();
        let cfg = config.clone();
        let pending = pending_count.clone();
        let met = metrics.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let start = Instant::now();

            info!(
                request_id = event.request_id,
                request = %event.request,
                callback = %event.callback_program,
                slot = event.request_slot,
                "Fulfilling randomness request"
            );

            match fulfill_request(&rpc, &cfg, &event).await {
                Ok(Outcome::Fulfilled(sig)) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    met.record_fulfillment(latency_ms);
                    info!(
                        request_id = event.request_id,
                        signature = %sig,
                        latency_ms,
                        explorer = %cfg.explorer_url(&sig),
                        "Fulfilled successfully"
                    );
                }
                Ok(Outcome::Skipped(reason)) => {
                    met.record_skip();
                    info!(
                        request_id = event.request_id,
                        %reason,
                        "Skipping request"
                    );
                }
                Err(e) => handle_fulfillment_error(event.request_id, e, &met),
            }

            pending.fetch_sub(1, Ordering::Relaxed);
        });
    }

    info!("Fulfiller channel closed, shutting down");
}

fn handle_fulfillment_error(request_id: u64, error: anyhow::Error, metrics: &Metrics) {
    let err_str = format!("{error:#}");
    if is_non_retryable(&err_str) {
        metrics.record_skip();
        warn!(
            request_id,
            reason = %err_str,
            "Skipping request (non-retryable)"
        );
    } else {
        metrics.record_failure();
        error!(
            request_id,
            error = %err_str,
            "Failed to fulfill"
        );
    }
}

/// Re-read the request, compute its output, and submit the fulfillment.
///
/// Request fields come from the account, not the event, and the callback
/// accounts are exactly the ones stored on it.
#[instrument(skip_all, fields(request_id = event.request_id, request = %event.request))]
async fn fulfill_request(
    rpc_client: &RpcClient,
    config: &AppConfig,
    event: &RandomnessRequestedEvent,
) -> Result<Outcome> {
    let data = rpc_client
        .get_account_data(&event.request)
        .await
        .context("failed to fetch request account")?;
    let request = RequestAccount::parse(&data).context("failed to parse request account")?;
    if let Some(reason) = skip_reason(config, &request) {
        return Ok(Outcome::Skipped(reason));
    }

    // Re-read per request: the admin may rotate the treasury at any time.
    let config_data = rpc_client
        .get_account_data(&config.vrf_config)
        .await
        .context("failed to fetch VRF configuration")?;
    let treasury = QueueConfig::parse(&config_data)?.treasury;

    let randomness = compute_randomness(
        &config.hmac_secret,
        &event.request,
        &request.seed,
        request.request_slot,
        request.request_id,
    );
    info!(
        randomness = %bs58::encode(randomness).into_string(),
        escrow = request.escrow,
        "Computed randomness"
    );

    let message = fulfillment_message(&event.request, request.request_id, &randomness);
    let ed25519_ix = build_ed25519_instruction(config.authority_keypair.as_ref(), &message);

    let fulfill_ix = build_fulfill_instruction(
        &config.program_id,
        &config.authority_keypair.pubkey(),
        &config.vrf_config,
        &event.request,
        &treasury,
        &request,
        &randomness,
    );

    let instructions =
        assemble_instructions(ed25519_ix, fulfill_ix, config.priority_fee_micro_lamports);

    send_with_retries(rpc_client, config, &instructions, request.request_id)
        .await
        .map(Outcome::Fulfilled)
}

/// Order the transaction's instructions. The program introspects index 0 for
/// the Ed25519 proof, so the compute budget instruction goes after it.
fn assemble_instructions(
    ed25519_ix: Instruction,
    fulfill_ix: Instruction,
    priority_fee_micro_lamports: u64,
) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(3);
    instructions.push(ed25519_ix);
    if priority_fee_micro_lamports > 0 {
        instructions.push(build_set_compute_unit_price_instruction(
            priority_fee_micro_lamports,
        ));
    }
    instructions.push(fulfill_ix);
    instructions
}

/// Send a transaction with exponential backoff on BlockhashNotFound.
async fn send_with_retries(
    rpc_client: &RpcClient,
    config: &AppConfig,
    instructions: &[Instruction],
    request_id: u64,
) -> Result<String> {
    let policy = config.retry;

    for attempt in 0..policy.max_attempts {
        let blockhash = rpc_client
            .get_latest_blockhash()
            .await
            .context("failed to fetch latest blockhash")?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&config.authority_keypair.pubkey()),
            &[config.authority_keypair.as_ref()],
            blockhash,
        );

        match rpc_client.send_and_confirm_transaction(&tx).await {
            Ok(sig) => return Ok(sig.to_string()),
            Err(e)
                if e.to_string().contains("BlockhashNotFound")
                    && attempt + 1 < policy.max_attempts =>
            {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay = ?delay,
                    "BlockhashNotFound, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e).context("send_and_confirm_transaction failed"),
        }
    }

    anyhow::bail!(
        "max retries ({}) exceeded for request_id={}",
        policy.max_attempts,
        request_id
    )
}

/// Construct a native Ed25519 signature-verify instruction with all data
/// inline (instruction indices `u16::MAX`).
fn build_ed25519_instruction(keypair: &Keypair, message: &[u8]) -> Instruction {
    use solana_sdk::ed25519_program;

    let signature = keypair.sign_message(message);
    let pubkey = keypair.pubkey();

    let public_key_offset = ED25519_HEADER_LEN as u16;
    let signature_offset = (ED25519_HEADER_LEN + 32) as u16;
    let message_data_offset = (ED25519_HEADER_LEN + 32 + 64) as u16;
    let message_data_size = message.len() as u16;

    let mut data = Vec::with_capacity(ED25519_HEADER_LEN + 32 + 64 + message.len());

    data.push(1u8); // num_signatures
    data.push(0u8); // padding

    data.extend_from_slice(&signature_offset.to_le_bytes());
    data.extend_from_slice(&u16::MAX.to_le_bytes());
    data.extend_from_slice(&public_key_offset.to_le_bytes());
    data.extend_from_slice(&u16::MAX.to_le_bytes());
    data.extend_from_slice(&message_data_offset.to_le_bytes());
    data.extend_from_slice(&message_data_size.to_le_bytes());
    data.extend_from_slice(&u16::MAX.to_le_bytes());

    data.extend_from_slice(&pubkey.to_bytes());
    data.extend_from_slice(signature.as_ref());
    data.extend_from_slice(message);

    Instruction {
        program_id: ed25519_program::id(),
        accounts: vec![],
        data,
    }
}

/// Build a `SetComputeUnitPrice` instruction.
fn build_set_compute_unit_price_instruction(micro_lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(9);
    data.push(3u8);
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    Instruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: vec![],
        data,
    }
}

/// Build the `fulfill_randomness` instruction.
fn build_fulfill_instruction(
    program_id: &Pubkey,
    authority: &Pubkey,
    config_pda: &Pubkey,
    request_pda: &Pubkey,
    treasury: &Pubkey,
    request: &RequestAccount,
    randomness: &[u8; 32],
) -> Instruction {
    let mut data = Vec::with_capacity(8 + 8 + 32);
    data.extend_from_slice(&instruction_discriminator("fulfill_randomness"));
    data.extend_from_slice(&request.request_id.to_le_bytes());
    data.extend_from_slice(randomness);

    let mut accounts = vec![
        AccountMeta::new(*authority, true),                         // oracle authority (signer, payer)
        AccountMeta::new_readonly(*config_pda, false),              // VRF configuration PDA
        AccountMeta::new(*request_pda, false),                      // randomness request PDA
        AccountMeta::new(*treasury, false),                         // fee recipient
        AccountMeta::new_readonly(request.callback_program, false), // callback program
        AccountMeta::new_readonly(sysvar::instructions::ID, false), // instructions sysvar
    ];
    accounts.extend(request.callback_metas());

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::config_address;
    use crate::accounts::tests::request_bytes;
    use crate::config::RetryPolicy;
    use std::time::Duration;

    fn config_serving(callback_programs: Vec<Pubkey>) -> AppConfig {
        let program_id = Pubkey::new_unique();
        AppConfig {
            rpc_url: String::new(),
            ws_url: String::new(),
            authority_keypair: Arc::new(Keypair::new()),
            hmac_secret: b"secret".to_vec(),
            program_id,
            vrf_config: config_address(&program_id),
            callback_programs,
            cluster: "devnet".into(),
            http_port: 8080,
            retry: RetryPolicy {
                max_attempts: 5,
                initial_delay: Duration::from_millis(500),
            },
            priority_fee_micro_lamports: 0,
            fulfillment_concurrency: 4,
        }
    }

    #[test]
    fn recognizes_non_retryable_errors() {
        assert!(is_non_retryable("custom program error: 0x1770"));
        assert!(is_non_retryable("custom program error: 0x1778"));
        assert!(is_non_retryable("Error Code: RequestNotPending"));
        assert!(!is_non_retryable("BlockhashNotFound"));
        assert!(!is_non_retryable("custom program error: 0x1771"));
    }

    #[test]
    fn delivered_or_expired_requests_are_not_retried() {
        assert!(is_non_retryable("custom program error: 0x1780"));
        assert!(is_non_retryable("custom program error: 0x1781"));
        assert!(is_non_retryable("custom program error: 0x1784"));
        assert!(is_non_retryable("Error Code: AlreadyFulfilled"));
        assert!(is_non_retryable("Error Code: StaleRequest"));
        assert!(!is_non_retryable("custom program error: 0x1782"));
    }

    #[test]
    fn settled_request_is_skipped() {
        let request = RequestAccount::parse(&request_bytes(1, &[])).unwrap();
        assert_eq!(
            skip_reason(&config_serving(Vec::new()), &request),
            Some(SkipReason::NotPending(1))
        );
    }

    #[test]
    fn only_served_callback_programs_are_fulfilled() {
        let request = RequestAccount::parse(&request_bytes(0, &[])).unwrap();
        assert_eq!(skip_reason(&config_serving(Vec::new()), &request), None);
        assert_eq!(
            skip_reason(&config_serving(vec![request.callback_program]), &request),
            None
        );
        assert_eq!(
            skip_reason(&config_serving(vec![Pubkey::new_unique()]), &request),
            Some(SkipReason::UnservedCallback(request.callback_program))
        );
    }

    #[test]
    fn ed25519_instruction_is_self_contained() {
        let keypair = Keypair::new();
        let message = fulfillment_message(&Pubkey::new_unique(), 5, &[8u8; 32]);
        let ix = build_ed25519_instruction(&keypair, &message);

        let data = &ix.data;
        assert_eq!(data[0], 1);
        for index_field in [1usize, 3, 6] {
            let at = 2 + 2 * index_field;
            assert_eq!(u16::from_le_bytes([data[at], data[at + 1]]), u16::MAX);
        }
        assert_eq!(&data[16..48], keypair.pubkey().as_ref());
        assert_eq!(&data[16 + 32 + 64..], message.as_slice());
    }

    #[test]
    fn proof_stays_first_with_priority_fee() {
        let keypair = Keypair::new();
        let ed25519_ix = build_ed25519_instruction(&keypair, b"msg");
        let fulfill_ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![],
        };

        let with_fee = assemble_instructions(ed25519_ix.clone(), fulfill_ix.clone(), 1_000);
        assert_eq!(with_fee.len(), 3);
        assert_eq!(with_fee[0], ed25519_ix);
        assert_eq!(with_fee[1].program_id, COMPUTE_BUDGET_PROGRAM_ID);
        assert_eq!(with_fee[2], fulfill_ix);

        let without_fee = assemble_instructions(ed25519_ix.clone(), fulfill_ix, 0);
        assert_eq!(without_fee.len(), 2);
        assert_eq!(without_fee[0], ed25519_ix);
    }

    #[test]
    fn fulfill_instruction_appends_stored_callback_accounts() {
        let player = Pubkey::new_unique();
        let token = Pubkey::new_unique();
        let request = RequestAccount::parse(&request_bytes(0, &[(player, true), (token, false)])).unwrap();

        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let request_pda = Pubkey::new_unique();
        let treasury = Pubkey::new_unique();
        let config_pda = config_address(&program_id);
        let ix = build_fulfill_instruction(
            &program_id,
            &authority,
            &config_pda,
            &request_pda,
            &treasury,
            &request,
            &[1u8; 32],
        );

        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                authority,
                config_pda,
                request_pda,
                treasury,
                request.callback_program,
                sysvar::instructions::ID,
                player,
                token,
            ]
        );
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[6].is_writable);
        assert!(!ix.accounts[7].is_writable);

        assert_eq!(&ix.data[..8], &instruction_discriminator("fulfill_randomness"));
        assert_eq!(&ix.data[8..16], &42u64.to_le_bytes());
        assert_eq!(&ix.data[16..], &[1u8; 32]);
    }
}
