//! On-chain event listener for the VRF program.
//!
//! Two complementary strategies ensure no requests are missed:
//!
//! 1. **Catch-up scan** ([`catch_up_pending_requests`]): on startup, queries
//!    `getProgramAccounts` for requests still in `Requested` status that
//!    arrived while the backend was offline.
//!
//! 2. **Live stream** ([`listen_for_events`]): subscribes to program log
//!    events via WebSocket, parses `RandomnessRequested` Anchor events in
//!    real-time, and auto-reconnects on disconnection.

use anyhow::Result;
use base64::Engine;
use futures_util::StreamExt;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcTransactionLogsConfig,
    RpcTransactionLogsFilter,
};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::accounts::{
    account_discriminator, event_discriminator, Reader, RequestAccount, STATUS_OFFSET,
    STATUS_REQUESTED,
};
use crate::config::AppConfig;

/// Parsed `RandomnessRequested` event, or the same fields recovered from a
/// request account during catch-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomnessRequestedEvent {
    pub request_id: u64,
    pub request: Pubkey,
    pub authority: Pubkey,
    pub seed: [u8; 32],
    pub request_slot: u64,
    pub callback_program: Pubkey,
}

impl RandomnessRequestedEvent {
    fn from_account(request: Pubkey, account: &RequestAccount) -> Self {
        Self {
            request_id: account.request_id,
            request,
            authority: account.authority,
            seed: account.seed,
            request_slot: account.request_slot,
            callback_program: account.callback_program,
        }
    }
}

/// Delay before reconnecting to the WebSocket after a disconnect or error.
const WS_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Scan for requests still waiting on the oracle.
///
/// Filters on the `RandomnessRequest` discriminator and a `Requested` status
/// byte; each match is forwarded to the fulfiller.
pub async fn catch_up_pending_requests(
    config: &AppConfig,
    tx: &mpsc::Sender<RandomnessRequestedEvent>,
) {
    info!("Scanning for pending requests");

    let client = RpcClient::new(config.rpc_url.clone());

    let filters = vec![
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            0,
            account_discriminator("RandomnessRequest").to_vec(),
        )),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(STATUS_OFFSET, vec![STATUS_REQUESTED])),
    ];

    let account_config = RpcProgramAccountsConfig {
        filters: Some(filters),
        account_config: RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            ..Default::default()
        },
        ..Default::default()
    };

    let accounts = match client
        .get_program_ui_accounts_with_config(&config.program_id, account_config)
        .await
    {
        Ok(accounts) => accounts,
        Err(e) => {
            error!(error = %e, "Failed to fetch program accounts");
            return;
        }
    };

    info!(count = accounts.len(), "Found pending requests");
    for (pubkey, ui_account) in accounts {
        let Some(data) = ui_account.data.decode() else {
            warn!(account = %pubkey, "Failed to decode account data, skipping");
            continue;
        };

        let account = match RequestAccount::parse(&data) {
            Ok(account) => account,
            Err(e) => {
                warn!(account = %pubkey, error = %e, "Malformed request account, skipping");
                continue;
            }
        };

        info!(
            request_id = account.request_id,
            request = %pubkey,
            slot = account.request_slot,
            "Queued pending request"
        );

        if tx
            .send(RandomnessRequestedEvent::from_account(pubkey, &account))
            .await
            .is_err()
        {
            error!("Channel closed while catching up pending requests");
            return;
        }
    }
}

/// Subscribe to program logs via WebSocket and forward `RandomnessRequested`
/// events to the fulfiller. Automatically reconnects on disconnection.
pub async fn listen_for_events(config: AppConfig, tx: mpsc::Sender<RandomnessRequestedEvent>) {
    let discriminator = event_discriminator("RandomnessRequested");

    loop {
        info!(url = %config.ws_url, "Connecting to WebSocket");

        match PubsubClient::new(&config.ws_url).await {
            Ok(pubsub) => {
                info!("WebSocket connected");

                let filter =
                    RpcTransactionLogsFilter::Mentions(vec![config.program_id.to_string()]);
                let logs_config = RpcTransactionLogsConfig {
                    commitment: Some(CommitmentConfig::confirmed()),
                };

                match pubsub.logs_subscribe(filter, logs_config).await {
                    Ok((mut stream, _unsub)) => {
                        while let Some(log_result) = stream.next().await {
                            if log_result.value.err.is_some() {
                                continue;
                            }
                            for event in extract_events(&log_result.value.logs, &discriminator) {
                                info!(
                                    request_id = event.request_id,
                                    request = %event.request,
                                    slot = event.request_slot,
                                    "Received RandomnessRequested event"
                                );
                                if tx.send(event).await.is_err() {
                                    error!("Channel closed, stopping listener");
                                    return;
                                }
                            }
                        }
                        warn!("WebSocket stream ended, reconnecting");
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to subscribe to logs");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to WebSocket");
            }
        }

        info!(delay = ?WS_RECONNECT_DELAY, "Reconnecting");
        tokio::time::sleep(WS_RECONNECT_DELAY).await;
    }
}

/// Pull every `RandomnessRequested` event out of a transaction's logs.
///
/// Anchor emits events as base64 `Program data:` lines whose first 8 bytes
/// are the event discriminator.
fn extract_events(logs: &[String], discriminator: &[u8; 8]) -> Vec<RandomnessRequestedEvent> {
    let mut events = Vec::new();
    for log_line in logs {
        let Some(data_str) = log_line.strip_prefix("Program data: ") else {
            continue;
        };

        let decoded = match base64::engine::general_purpose::STANDARD.decode(data_str.trim()) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "Failed to decode base64 log data");
                continue;
            }
        };

        if decoded.len() < 8 || decoded[..8] != *discriminator {
            continue;
        }

        match parse_randomness_requested(&decoded[8..]) {
            Ok(event) => events.push(event),
            Err(e) => warn!(error = %e, "Failed to parse RandomnessRequested event payload"),
        }
    }
    events
}

/// Borsh body of `RandomnessRequested`: `request_id (8) + request (32) +
/// authority (32) + seed (32) + request_slot (8) + callback_program (32)`.
fn parse_randomness_requested(data: &[u8]) -> Result<RandomnessRequestedEvent> {
    let mut reader = Reader::new(data);
    Ok(RandomnessRequestedEvent {
        request_id: reader.u64()?,
        request: reader.pubkey()?,
        authority: reader.pubkey()?,
        seed: reader.array()?,
        request_slot: reader.u64()?,
        callback_program: reader.pubkey()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::tests::request_bytes;

    fn sample_event() -> RandomnessRequestedEvent {
        RandomnessRequestedEvent {
            request_id: 11,
            request: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            seed: [4u8; 32],
            request_slot: 1_234,
            callback_program: Pubkey::new_unique(),
        }
    }

    fn log_line(discriminator: &[u8; 8], event: &RandomnessRequestedEvent) -> String {
        let mut data = discriminator.to_vec();
        data.extend_from_slice(&event.request_id.to_le_bytes());
        data.extend_from_slice(event.request.as_ref());
        data.extend_from_slice(event.authority.as_ref());
        data.extend_from_slice(&event.seed);
        data.extend_from_slice(&event.request_slot.to_le_bytes());
        data.extend_from_slice(event.callback_program.as_ref());
        format!(
            "Program data: {}",
            base64::engine::general_purpose::STANDARD.encode(data)
        )
    }

    #[test]
    fn extracts_requested_events_among_other_logs() {
        let disc = event_discriminator("RandomnessRequested");
        let event = sample_event();
        let other = log_line(&event_discriminator("RandomnessFulfilled"), &sample_event());
        let logs = vec![
            "Program log: Instruction: RequestRandomness".to_string(),
            other,
            log_line(&disc, &event),
            "Program data: not-base64!".to_string(),
        ];

        assert_eq!(extract_events(&logs, &disc), vec![event]);
    }

    #[test]
    fn truncated_payload_is_dropped() {
        let disc = event_discriminator("RandomnessRequested");
        let mut line = log_line(&disc, &sample_event());
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(line.strip_prefix("Program data: ").unwrap())
            .unwrap();
        line = format!(
            "Program data: {}",
            base64::engine::general_purpose::STANDARD.encode(&decoded[..decoded.len() - 1])
        );
        assert!(extract_events(&[line], &disc).is_empty());
    }

    #[test]
    fn catch_up_event_mirrors_account() {
        let request = Pubkey::new_unique();
        let account = RequestAccount::parse(&request_bytes(0, &[])).unwrap();
        let event = RandomnessRequestedEvent::from_account(request, &account);

        assert_eq!(event.request, request);
        assert_eq!(event.request_id, 42);
        assert_eq!(event.request_slot, 900);
        assert_eq!(event.callback_program, account.callback_program);
    }
}
