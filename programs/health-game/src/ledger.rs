//! Balance arithmetic checked before any token CPI is issued.

use anchor_lang::prelude::*;

use crate::constants::HEAL_COST_UNITS;
use crate::errors::GameError;
use crate::settlement::token_unit;

/// Base units burned by one heal.
pub fn heal_cost(unit: u64) -> Result<u64> {
    HEAL_COST_UNITS
        .checked_mul(unit)
        .ok_or_else(|| error!(GameError::MathOverflow))
}

/// `(cost, remaining)` for one heal from a token account holding `balance`.
///
/// A token account created on the heal itself holds zero and fails here.
pub fn heal_charge(balance: u64, decimals: u8) -> Result<(u64, u64)> {
    let cost = heal_cost(token_unit(decimals)?)?;
    Ok((cost, debit(balance, cost)?))
}

/// Lamports a wallet needs to open a request: the queue fee plus the
/// rent-exempt minimum of the request account.
pub fn escrow_requirement(fee: u64, request_rent: u64) -> Result<u64> {
    fee.checked_add(request_rent)
        .ok_or_else(|| error!(GameError::MathOverflow))
}

pub fn debit(balance: u64, amount: u64) -> Result<u64> {
    balance
        .checked_sub(amount)
        .ok_or_else(|| error!(GameError::InsufficientBalance))
}

pub fn credit(balance: u64, amount: u64) -> Result<u64> {
    balance
        .checked_add(amount)
        .ok_or_else(|| error!(GameError::MathOverflow))
}

/// Post-transfer balances `(source, destination)` for moving `amount`.
pub fn move_balance(source: u64, destination: u64, amount: u64) -> Result<(u64, u64)> {
    require!(amount > 0, GameError::InvalidAmount);
    Ok((debit(source, amount)?, credit(destination, amount)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: u64 = 1_000_000_000;

    #[test]
    fn deposit_then_withdraw_restores_balances() {
        let player = 7 * UNIT;
        let vault = 0;

        let (player, vault) = move_balance(player, vault, 3 * UNIT).unwrap();
        assert_eq!((player, vault), (4 * UNIT, 3 * UNIT));

        let (vault, player) = move_balance(vault, player, 3 * UNIT).unwrap();
        assert_eq!(player, 7 * UNIT);
        assert_eq!(vault, 0);
    }

    #[test]
    fn overdraw_is_insufficient_balance() {
        let err = move_balance(UNIT, 0, UNIT + 1).unwrap_err();
        assert_eq!(err, GameError::InsufficientBalance.into());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = move_balance(UNIT, 0, 0).unwrap_err();
        assert_eq!(err, GameError::InvalidAmount.into());
    }

    #[test]
    fn heal_burns_exactly_one_unit() {
        let cost = heal_cost(UNIT).unwrap();
        assert_eq!(debit(UNIT, cost).unwrap(), 0);
        assert_eq!(debit(0, cost).unwrap_err(), GameError::InsufficientBalance.into());
    }

    #[test]
    fn fresh_token_account_cannot_heal() {
        let err = heal_charge(0, 9).unwrap_err();
        assert_eq!(err, GameError::InsufficientBalance.into());
    }

    #[test]
    fn heal_charge_leaves_the_rest_of_the_balance() {
        assert_eq!(heal_charge(5 * UNIT, 9).unwrap(), (UNIT, 4 * UNIT));
    }

    #[test]
    fn escrow_requirement_adds_fee_and_rent() {
        assert_eq!(escrow_requirement(5_000, 2_000_000).unwrap(), 2_005_000);
        assert_eq!(
            escrow_requirement(u64::MAX, 1).unwrap_err(),
            GameError::MathOverflow.into()
        );
    }
}
