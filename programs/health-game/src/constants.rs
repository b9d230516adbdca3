/// Seeds for the singleton game configuration PDA.
pub const GAME_CONFIG_SEED: &[u8] = b"game-config";
/// Seeds prefix for player accounts: `["player", owner]`.
pub const PLAYER_SEED: &[u8] = b"player";
/// Seeds for the reward mint, which is also its own mint authority.
pub const REWARD_MINT_SEED: &[u8] = b"reward";
/// Seeds prefix for per-player vault token accounts: `["vault", player_data]`.
pub const VAULT_SEED: &[u8] = b"vault";
/// Seeds of the randomness queue configuration inside `vrf_sol`.
pub const VRF_CONFIG_SEED: &[u8] = b"vrf-config";

pub const MAX_HEALTH: u8 = 100;
/// `randomness mod 101` yields damage in `0..=100`.
pub const DAMAGE_MODULUS: u128 = 101;
pub const REWARD_DECIMALS: u8 = 9;
/// Whole reward tokens burned by one heal.
pub const HEAL_COST_UNITS: u64 = 1;
