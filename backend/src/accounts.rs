//! Decoding of `vrf_sol` account data and Anchor discriminators.
//!
//! The backend does not link the on-chain crate; it reads the Borsh layout
//! directly. Offsets below include the 8-byte account discriminator.
//!
//! ```text
//! RandomnessRequest
//!   [0..8]      discriminator
//!   [8..16]     request_id      (u64)
//!   [16..48]    authority       (Pubkey)
//!   [48..80]    payer           (Pubkey)
//!   [80..112]   seed            ([u8; 32])
//!   [112..120]  request_slot    (u64)
//!   [120]       status          (u8)  0 = Requested
//!   [121..129]  escrow          (u64)
//!   [129..161]  randomness      ([u8; 32])
//!   [161..169]  fulfilled_slot  (u64)
//!   [169]       bump            (u8)
//!   [170..]     callback: program_id (32), discriminator (8),
//!               accounts: u32 len + len x (pubkey (32), is_writable (1))
//! ```

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;

/// Byte offset of `RandomnessRequest::status`, used for the catch-up memcmp.
pub const STATUS_OFFSET: usize = 120;
pub const STATUS_REQUESTED: u8 = 0;

/// Upper bound on stored callback accounts enforced on-chain.
const MAX_CALLBACK_ACCOUNTS: usize = 8;

/// Seeds of the queue configuration PDA.
pub const VRF_CONFIG_SEED: &[u8] = b"vrf-config";

fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}"));
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// `sha256("account:<Name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; 8] {
    discriminator("account", name)
}

/// `sha256("event:<Name>")[..8]`
pub fn event_discriminator(name: &str) -> [u8; 8] {
    discriminator("event", name)
}

/// `sha256("global:<snake_name>")[..8]`
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator("global", name)
}

pub fn config_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[VRF_CONFIG_SEED], program_id).0
}

/// Sequential little-endian reader over Borsh data.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).context("offset overflow")?;
        let bytes = self
            .data
            .get(self.pos..end)
            .with_context(|| format!("data truncated at offset {} (len {})", self.pos, self.data.len()))?;
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::new_from_array(self.array()?))
    }
}

/// One entry of the stored callback account list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackAccount {
    pub pubkey: Pubkey,
    pub is_writable: bool,
}

/// The fields of an on-chain `RandomnessRequest` the fulfiller needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAccount {
    pub request_id: u64,
    pub authority: Pubkey,
    pub seed: [u8; 32],
    pub request_slot: u64,
    pub status: u8,
    pub escrow: u64,
    pub callback_program: Pubkey,
    pub callback_accounts: Vec<CallbackAccount>,
}

impl RequestAccount {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let disc: [u8; 8] = reader.array()?;
        if disc != account_discriminator("RandomnessRequest") {
            bail!("not a RandomnessRequest account");
        }

        let request_id = reader.u64()?;
        let authority = reader.pubkey()?;
        reader.skip(32)?; // payer
        let seed = reader.array()?;
        let request_slot = reader.u64()?;
        let status = reader.u8()?;
        let escrow = reader.u64()?;
        reader.skip(32 + 8 + 1)?; // randomness, fulfilled_slot, bump

        let callback_program = reader.pubkey()?;
        reader.skip(8)?; // callback discriminator, only the program reads it
        let count = reader.u32()? as usize;
        if count > MAX_CALLBACK_ACCOUNTS {
            bail!("callback account count {count} exceeds {MAX_CALLBACK_ACCOUNTS}");
        }
        let callback_accounts = (0..count)
            .map(|_| {
                Ok(CallbackAccount {
                    pubkey: reader.pubkey()?,
                    is_writable: reader.u8()? != 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            request_id,
            authority,
            seed,
            request_slot,
            status,
            escrow,
            callback_program,
            callback_accounts,
        })
    }

    pub fn is_requested(&self) -> bool {
        self.status == STATUS_REQUESTED
    }

    /// Remaining accounts for `fulfill_randomness`, exactly as stored.
    pub fn callback_metas(&self) -> Vec<AccountMeta> {
        self.callback_accounts
            .iter()
            .map(|account| {
                if account.is_writable {
                    AccountMeta::new(account.pubkey, false)
                } else {
                    AccountMeta::new_readonly(account.pubkey, false)
                }
            })
            .collect()
    }
}

/// The queue configuration as the oracle sees it.
///
/// ```text
/// VrfConfiguration
///   [0..8]      discriminator
///   [8..40]     admin
///   [40..72]    authority
///   [72..104]   treasury
///   [104..112]  fee
///   [112..120]  request_counter
///   [120..128]  request_timeout_slots
///   [128]       paused
///   [129]       bump
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub authority: Pubkey,
    pub treasury: Pubkey,
    pub fee: u64,
    pub request_counter: u64,
    pub request_timeout_slots: u64,
    pub paused: bool,
}

impl QueueConfig {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let disc: [u8; 8] = reader.array()?;
        if disc != account_discriminator("VrfConfiguration") {
            bail!("not a VrfConfiguration account");
        }
        reader.skip(32)?; // admin
        Ok(Self {
            authority: reader.pubkey()?,
            treasury: reader.pubkey()?,
            fee: reader.u64()?,
            request_counter: reader.u64()?,
            request_timeout_slots: reader.u64()?,
            paused: reader.u8()? != 0,
        })
    }
}
