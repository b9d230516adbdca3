//! Oracle configuration.
//!
//! Loaded once from the environment (after `.env`), then checked against the
//! chain before any subsystem starts:
//!
//! - the queue configuration PDA is derived from `PROGRAM_ID`, and its
//!   on-chain `authority` must be the key this oracle signs with;
//! - every program in `CALLBACK_PROGRAM_IDS` must be deployed.
//!
//! | Variable                      | Default                     |
//! |-------------------------------|-----------------------------|
//! | `PROGRAM_ID`                  | required                    |
//! | `HMAC_SECRET`                 | required                    |
//! | `AUTHORITY_KEYPAIR_PATH`      | `~/.config/solana/id.json`  |
//! | `CALLBACK_PROGRAM_IDS`        | empty (serve every program) |
//! | `RPC_URL` / `WS_URL`          | local validator             |
//! | `CLUSTER`                     | `devnet`                    |
//! | `HTTP_PORT`                   | `8080`                      |
//! | `MAX_RETRIES`                 | `5`                         |
//! | `INITIAL_RETRY_DELAY_MS`      | `500`                       |
//! | `PRIORITY_FEE_MICRO_LAMPORTS` | `0`                         |
//! | `FULFILLMENT_CONCURRENCY`     | `4`                         |

use anyhow::{bail, ensure, Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::accounts::{config_address, QueueConfig};

/// Upper bound on the backoff between send attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Backoff for resubmitting a fulfillment after `BlockhashNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Delay after the failed attempt numbered `attempt` (0-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub ws_url: String,
    /// Signs fulfillment proofs and pays for the transactions.
    pub authority_keypair: Arc<Keypair>,
    pub hmac_secret: Vec<u8>,
    /// The deployed `vrf_sol` program.
    pub program_id: Pubkey,
    /// `["vrf-config"]` PDA of `program_id`.
    pub vrf_config: Pubkey,
    /// Consumer programs this oracle fulfills for; empty serves all.
    pub callback_programs: Vec<Pubkey>,
    /// Cluster name for explorer URLs.
    pub cluster: String,
    pub http_port: u16,
    pub retry: RetryPolicy,
    pub priority_fee_micro_lamports: u64,
    pub fulfillment_concurrency: usize,
}

/// Variable lookup, so loading can be exercised without touching the
/// process environment.
pub struct Env<F>(pub F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn text(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &str) -> Result<String> {
        self.get(name)
            .with_context(|| format!("{name} env var must be set"))
    }

    /// Parsed value or `default` when unset; a value that does not parse is
    /// an error rather than a silent fallback.
    fn parsed<T: FromStr>(&self, name: &str, default: T) -> Result<T> {
        match self.get(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid {name}: {raw}")),
            None => Ok(default),
        }
    }

    fn positive<T: FromStr + PartialOrd + Default>(&self, name: &str, default: T) -> Result<T> {
        let value = self.parsed(name, default)?;
        ensure!(value > T::default(), "{name} must be greater than zero");
        Ok(value)
    }

    fn pubkey_list(&self, name: &str) -> Result<Vec<Pubkey>> {
        let Some(raw) = self.get(name) else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Pubkey::from_str(item).with_context(|| format!("invalid {name} entry: {item}")))
            .collect()
    }
}

fn process_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Env<fn(&str) -> Option<String>> {
    pub fn process() -> Self {
        Env(process_var as fn(&str) -> Option<String>)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(&Env::process())
    }

    pub fn load<F>(env: &Env<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let program_id_str = env.required("PROGRAM_ID")?;
        let program_id = Pubkey::from_str(&program_id_str)
            .with_context(|| format!("invalid PROGRAM_ID: {program_id_str}"))?;

        let hmac_secret = env.required("HMAC_SECRET")?.into_bytes();

        let keypair_path = env.text("AUTHORITY_KEYPAIR_PATH", "~/.config/solana/id.json");
        let keypair_path = shellexpand::tilde(&keypair_path).to_string();
        let authority_keypair = read_keypair_file(&keypair_path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to read keypair from {keypair_path}"))?;

        let callback_programs = env.pubkey_list("CALLBACK_PROGRAM_IDS")?;
        ensure!(
            !callback_programs.contains(&program_id),
            "CALLBACK_PROGRAM_IDS must not contain the queue program itself"
        );

        Ok(Self {
            rpc_url: env.text("RPC_URL", "http://127.0.0.1:8899"),
            ws_url: env.text("WS_URL", "ws://127.0.0.1:8900"),
            authority_keypair: Arc::new(authority_keypair),
            hmac_secret,
            program_id,
            vrf_config: config_address(&program_id),
            callback_programs,
            cluster: env.text("CLUSTER", "devnet"),
            http_port: env.parsed("HTTP_PORT", 8080)?,
            retry: RetryPolicy {
                max_attempts: env.positive("MAX_RETRIES", 5)?,
                initial_delay: Duration::from_millis(env.parsed("INITIAL_RETRY_DELAY_MS", 500)?),
            },
            priority_fee_micro_lamports: env.parsed("PRIORITY_FEE_MICRO_LAMPORTS", 0)?,
            fulfillment_concurrency: env.positive("FULFILLMENT_CONCURRENCY", 4)?,
        })
    }

    /// Whether requests calling back into `program` are ours to fulfill.
    pub fn serves(&self, program: &Pubkey) -> bool {
        self.callback_programs.is_empty() || self.callback_programs.contains(program)
    }

    /// Confirms the deployment matches this configuration and returns the
    /// queue settings read from chain.
    pub async fn verify_deployment(&self, rpc: &RpcClient) -> Result<QueueConfig> {
        let data = rpc
            .get_account_data(&self.vrf_config)
            .await
            .with_context(|| format!("queue configuration {} not found", self.vrf_config))?;
        let queue = QueueConfig::parse(&data)?;
        self.check_queue(&queue)?;

        for program in &self.callback_programs {
            let account = rpc
                .get_account(program)
                .await
                .with_context(|| format!("callback program {program} not found"))?;
            if !account.executable {
                bail!("callback program {program} is not executable");
            }
        }

        if queue.paused {
            warn!("Queue is paused; pending requests are still fulfilled");
        }
        info!(
            vrf_config = %self.vrf_config,
            treasury = %queue.treasury,
            fee = queue.fee,
            timeout_slots = queue.request_timeout_slots,
            next_request_id = queue.request_counter,
            "Queue configuration verified"
        );
        Ok(queue)
    }

    fn check_queue(&self, queue: &QueueConfig) -> Result<()> {
        let signer = self.authority_keypair.pubkey();
        ensure!(
            queue.authority == signer,
            "queue authority is {} but AUTHORITY_KEYPAIR_PATH holds {}",
            queue.authority,
            signer
        );
        Ok(())
    }

    /// Solscan URL for a transaction signature.
    pub fn explorer_url(&self, signature: &str) -> String {
        match self.cluster.as_str() {
            "mainnet-beta" => format!("https://solscan.io/tx/{signature}"),
            cluster => format!("https://solscan.io/tx/{signature}?cluster={cluster}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Env<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Env(move |name: &str| vars.get(name).cloned())
    }

    /// Writes `keypair` in the Solana CLI JSON format and returns the path.
    fn keypair_file(keypair: &Keypair) -> String {
        let path = std::env::temp_dir().join(format!("vrf-backend-{}.json", keypair.pubkey()));
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        std::fs::write(&path, json).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn loaded(extra: &[(&str, &str)]) -> Result<AppConfig> {
        let keypair = Keypair::new();
        let path = keypair_file(&keypair);
        let program_id = Pubkey::new_unique().to_string();
        let mut vars = vec![
            ("PROGRAM_ID", program_id.as_str()),
            ("HMAC_SECRET", "secret"),
            ("AUTHORITY_KEYPAIR_PATH", path.as_str()),
        ];
        vars.extend_from_slice(extra);
        let result = AppConfig::load(&env(&vars));
        std::fs::remove_file(&path).ok();
        result
    }

    fn queue_with_authority(authority: Pubkey) -> QueueConfig {
        QueueConfig {
            authority,
            treasury: Pubkey::new_unique(),
            fee: 5_000,
            request_counter: 0,
            request_timeout_slots: 150,
            paused: false,
        }
    }

    #[test]
    fn defaults_and_derived_queue_address() {
        let config = loaded(&[]).unwrap();
        assert_eq!(config.vrf_config, config_address(&config.program_id));
        assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(500));
        assert_eq!(config.fulfillment_concurrency, 4);
        assert!(config.callback_programs.is_empty());
        assert!(config.serves(&Pubkey::new_unique()));
    }

    #[test]
    fn missing_required_values_fail() {
        let err = AppConfig::load(&env(&[("HMAC_SECRET", "s")])).err().unwrap();
        assert!(format!("{err:#}").contains("PROGRAM_ID"));

        let err = AppConfig::load(&env(&[("PROGRAM_ID", "not-a-key"), ("HMAC_SECRET", "s")]))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("invalid PROGRAM_ID"));
    }

    #[test]
    fn malformed_numbers_are_errors_not_defaults() {
        let err = loaded(&[("HTTP_PORT", "eighty")]).err().unwrap();
        assert!(format!("{err:#}").contains("HTTP_PORT"));

        let err = loaded(&[("FULFILLMENT_CONCURRENCY", "0")]).err().unwrap();
        assert!(format!("{err:#}").contains("greater than zero"));
    }

    #[test]
    fn callback_allowlist_restricts_served_programs() {
        let game = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let list = format!("{game}, {other},");
        let config = loaded(&[("CALLBACK_PROGRAM_IDS", list.as_str())]).unwrap();

        assert_eq!(config.callback_programs, vec![game, other]);
        assert!(config.serves(&game));
        assert!(!config.serves(&Pubkey::new_unique()));

        assert!(loaded(&[("CALLBACK_PROGRAM_IDS", "bogus")]).is_err());
    }

    #[test]
    fn queue_authority_must_be_our_signer() {
        let config = loaded(&[]).unwrap();
        let ours = config.authority_keypair.pubkey();
        config.check_queue(&queue_with_authority(ours)).unwrap();

        let err = config
            .check_queue(&queue_with_authority(Pubkey::new_unique()))
            .unwrap_err();
        assert!(err.to_string().contains("queue authority"));
    }

    #[test]
    fn retry_delay_doubles_up_to_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_after(0), Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(40), MAX_RETRY_DELAY);
    }

    #[test]
    fn explorer_url_omits_cluster_on_mainnet() {
        let mut config = loaded(&[("CLUSTER", "mainnet-beta")]).unwrap();
        assert_eq!(config.explorer_url("abc"), "https://solscan.io/tx/abc");
        config.cluster = "devnet".into();
        assert_eq!(config.explorer_url("abc"), "https://solscan.io/tx/abc?cluster=devnet");
    }
}
