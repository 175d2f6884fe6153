use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};
use crate::constants::BPS_DENOMINATOR;
use crate::errors::ErrorCode;

pub fn checked_add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(ErrorCode::MathOverflow.into())
}

pub fn checked_sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(ErrorCode::MathOverflow.into())
}

/// `a * b / c` in u128. `c == 0` is rejected before dividing.
pub fn mul_div(a: u64, b: u64, c: u64) -> Result<u64> {
    require!(c > 0, ErrorCode::MathOverflow);
    let v = (a as u128)
        .checked_mul(b as u128)
        .ok_or(ErrorCode::MathOverflow)?
        / c as u128;
    u64::try_from(v).map_err(|_| ErrorCode::MathOverflow.into())
}

pub fn mul_bps(amount: u64, bps: u64) -> Result<u64> {
    mul_div(amount, bps, BPS_DENOMINATOR)
}

/// Round `amount` down to a multiple of `unit`. A zero unit leaves the amount unchanged.
pub fn round_down(amount: u64, unit: u64) -> u64 {
    if unit == 0 {
        return amount;
    }
    amount - amount % unit
}

/// Grow `account` to at least `new_len` bytes, topping up rent from `payer`.
/// Callers must keep growth per instruction under the runtime's realloc limit.
pub fn ensure_account_len<'info>(
    account: &AccountInfo<'info>,
    payer: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    new_len: usize,
) -> Result<()> {
    if account.data_len() >= new_len {
        return Ok(());
    }

    let required = Rent::get()?.minimum_balance(new_len);
    let shortfall = required.saturating_sub(account.lamports());
    if shortfall > 0 {
        system_program::transfer(
            CpiContext::new(
                system_program.clone(),
                Transfer {
                    from: payer.clone(),
                    to: account.clone(),
                },
            ),
            shortfall,
        )?;
    }

    account.realloc(new_len, false)?;
    Ok(())
}
