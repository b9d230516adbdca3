//! Deterministic transform from a VRF output to damage and reward.

use anchor_lang::prelude::*;

use crate::constants::{DAMAGE_MODULUS, MAX_HEALTH};
use crate::errors::GameError;

/// Damage in `0..=100`: the first 16 bytes as a little-endian `u128`, mod 101.
pub fn damage_from_randomness(randomness: &[u8; 32]) -> u8 {
    let mut low = [0u8; 16];
    low.copy_from_slice(&randomness[..16]);
    (u128::from_le_bytes(low) % DAMAGE_MODULUS) as u8
}

/// One whole reward token in base units.
pub fn token_unit(decimals: u8) -> Result<u64> {
    10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| error!(GameError::MathOverflow))
}

/// Outcome of applying one randomness result to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub damage: u8,
    pub previous_health: u8,
    pub new_health: u8,
    /// Base units to mint; zero when no health was lost.
    pub reward: u64,
}

impl Settlement {
    pub fn compute(health: u8, randomness: &[u8; 32], unit: u64) -> Result<Self> {
        let previous_health = health.min(MAX_HEALTH);
        let damage = damage_from_randomness(randomness);
        let new_health = previous_health.saturating_sub(damage);

        let reward = if new_health < previous_health {
            u64::from(MAX_HEALTH - new_health)
                .checked_mul(unit)
                .ok_or(GameError::MathOverflow)?
        } else {
            0
        };

        Ok(Self {
            damage,
            previous_health,
            new_health,
            reward,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: u64 = 1_000_000_000;

    fn randomness_for(value: u128) -> [u8; 32] {
        let mut bytes = [0xAAu8; 32];
        bytes[..16].copy_from_slice(&value.to_le_bytes());
        bytes
    }

    #[test]
    fn damage_uses_low_sixteen_bytes_mod_101() {
        assert_eq!(damage_from_randomness(&randomness_for(0)), 0);
        assert_eq!(damage_from_randomness(&randomness_for(100)), 100);
        assert_eq!(damage_from_randomness(&randomness_for(101)), 0);
        assert_eq!(damage_from_randomness(&randomness_for(u128::MAX)), (u128::MAX % 101) as u8);
    }

    #[test]
    fn damage_is_always_in_range() {
        let mut value: u128 = 0x9E37_79B9_7F4A_7C15;
        for _ in 0..2_000 {
            value = value.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            assert!(damage_from_randomness(&randomness_for(value)) <= MAX_HEALTH);
        }
    }

    #[test]
    fn zero_damage_mints_nothing() {
        let s = Settlement::compute(100, &randomness_for(0), UNIT).unwrap();
        assert_eq!(s.new_health, 100);
        assert_eq!(s.reward, 0);
    }

    #[test]
    fn full_damage_mints_hundred_units() {
        let s = Settlement::compute(100, &randomness_for(100), UNIT).unwrap();
        assert_eq!(s.damage, 100);
        assert_eq!(s.new_health, 0);
        assert_eq!(s.reward, 100 * UNIT);
    }

    #[test]
    fn health_saturates_at_zero() {
        let s = Settlement::compute(30, &randomness_for(75), UNIT).unwrap();
        assert_eq!(s.new_health, 0);
        assert_eq!(s.reward, 100 * UNIT);
    }

    #[test]
    fn reward_depends_on_resulting_health() {
        let s = Settlement::compute(50, &randomness_for(10), UNIT).unwrap();
        assert_eq!(s.new_health, 40);
        assert_eq!(s.reward, 60 * UNIT);
    }

    #[test]
    fn already_dead_player_gets_no_reward() {
        let s = Settlement::compute(0, &randomness_for(42), UNIT).unwrap();
        assert_eq!(s.new_health, 0);
        assert_eq!(s.reward, 0);
    }

    #[test]
    fn reward_overflow_is_reported() {
        let err = Settlement::compute(100, &randomness_for(100), u64::MAX).unwrap_err();
        assert_eq!(err, GameError::MathOverflow.into());
    }

    #[test]
    fn unit_follows_decimals() {
        assert_eq!(token_unit(9).unwrap(), UNIT);
        assert_eq!(token_unit(0).unwrap(), 1);
        assert!(token_unit(20).is_err());
    }
}
