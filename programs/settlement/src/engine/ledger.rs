use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::constants::{DAILY_JACKPOT_BPS, EXTERMINATOR_BOOSTED_BPS, EXTERMINATOR_BPS};
use crate::engine::config::EngineConfig;
use crate::errors::ErrorCode;
use crate::utils::{checked_add_u64, checked_sub_u64, mul_bps, mul_div};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolId {
    Reward,
    CurrentPrize,
    NextPrize,
    Claimable,
    Auxiliary,
}

impl TryFrom<u8> for PoolId {
    type Error = anchor_lang::error::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PoolId::Reward),
            1 => Ok(PoolId::CurrentPrize),
            2 => Ok(PoolId::NextPrize),
            3 => Ok(PoolId::Claimable),
            4 => Ok(PoolId::Auxiliary),
            _ => err!(ErrorCode::InvalidPool),
        }
    }
}

/// Split of a successful bond route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BondSettlement {
    pub mirrored: u64,
    pub returned: u64,
    /// Leaves custody for the bond instrument.
    pub outflow: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelRotation {
    pub carried_to_reward: u64,
    pub prize_base: u64,
}

/// Named pool balances plus the assets actually held in custody.
/// `assets_held >= total_pooled()` after every mutating operation.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolLedger {
    pub assets_held: u64,
    pub reward: u64,
    pub current_prize: u64,
    pub next_prize: u64,
    pub claimable: u64,
    pub auxiliary: u64,
}

impl PoolLedger {
    pub fn balance(&self, pool: PoolId) -> u64 {
        match pool {
            PoolId::Reward => self.reward,
            PoolId::CurrentPrize => self.current_prize,
            PoolId::NextPrize => self.next_prize,
            PoolId::Claimable => self.claimable,
            PoolId::Auxiliary => self.auxiliary,
        }
    }

    fn slot(&mut self, pool: PoolId) -> &mut u64 {
        match pool {
            PoolId::Reward => &mut self.reward,
            PoolId::CurrentPrize => &mut self.current_prize,
            PoolId::NextPrize => &mut self.next_prize,
            PoolId::Claimable => &mut self.claimable,
            PoolId::Auxiliary => &mut self.auxiliary,
        }
    }

    /// New assets entering custody.
    pub fn deposit(&mut self, pool: PoolId, amount: u64) -> Result<()> {
        self.assets_held = checked_add_u64(self.assets_held, amount)?;
        self.credit(pool, amount)
    }

    pub fn credit(&mut self, pool: PoolId, amount: u64) -> Result<()> {
        let slot = self.slot(pool);
        *slot = checked_add_u64(*slot, amount)?;
        Ok(())
    }

    pub fn debit(&mut self, pool: PoolId, amount: u64) -> Result<()> {
        let slot = self.slot(pool);
        *slot = slot.checked_sub(amount).ok_or(ErrorCode::PoolUnderflow)?;
        Ok(())
    }

    pub fn transfer(&mut self, from: PoolId, to: PoolId, amount: u64) -> Result<()> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Assets leaving custody out of `pool`.
    pub fn release(&mut self, pool: PoolId, amount: u64) -> Result<()> {
        self.debit(pool, amount)?;
        self.assets_held = self
            .assets_held
            .checked_sub(amount)
            .ok_or(ErrorCode::Insolvent)?;
        Ok(())
    }

    /// Books a bond route of `amount` that was already taken out of a run's pool: the mirror
    /// stays in custody as auxiliary reserve, the reward return goes back to the reward pool
    /// and the rest leaves custody.
    pub fn settle_bond_route(&mut self, amount: u64, cfg: &EngineConfig) -> Result<BondSettlement> {
        let mirrored = mul_bps(amount, cfg.bond_mirror_bps as u64)?;
        let returned = mul_bps(amount, cfg.bond_reward_return_bps as u64)?;
        let outflow = checked_sub_u64(checked_sub_u64(amount, mirrored)?, returned)?;
        self.credit(PoolId::Auxiliary, mirrored)?;
        self.credit(PoolId::Reward, returned)?;
        self.assets_held = self
            .assets_held
            .checked_sub(outflow)
            .ok_or(ErrorCode::Insolvent)?;
        Ok(BondSettlement {
            mirrored,
            returned,
            outflow,
        })
    }

    pub fn total_pooled(&self) -> Result<u64> {
        [
            self.reward,
            self.current_prize,
            self.next_prize,
            self.claimable,
            self.auxiliary,
        ]
        .iter()
        .try_fold(0u64, |acc, v| checked_add_u64(acc, *v))
    }

    pub fn ensure_solvent(&self) -> Result<()> {
        require!(self.assets_held >= self.total_pooled()?, ErrorCode::Insolvent);
        Ok(())
    }

    /// Opens `new_level`: the next prize pool rolls into the current one, then a level-dependent
    /// fraction of reward + current is carried into the reward pool and the rest is the new
    /// level's prize base.
    pub fn rotate_level(&mut self, new_level: u32) -> Result<LevelRotation> {
        let next = self.next_prize;
        self.transfer(PoolId::NextPrize, PoolId::CurrentPrize, next)?;

        let total = checked_add_u64(self.reward, self.current_prize)?;
        let carried = mul_div(total, reward_carry_times2(new_level), 200)?;
        let prize_base = checked_sub_u64(total, carried)?;
        self.reward = carried;
        self.current_prize = prize_base;
        Ok(LevelRotation {
            carried_to_reward: carried,
            prize_base,
        })
    }

    /// Current prize slice for the daily jackpot of `day` within a level.
    pub fn daily_slice(&self, day: u8) -> Result<u64> {
        let idx = (day as usize).min(DAILY_JACKPOT_BPS.len() - 1);
        mul_bps(self.current_prize, DAILY_JACKPOT_BPS[idx] as u64)
    }
}

/// Reward carry in half-percent steps: ramps with the level, then +20 and capped at 196.
pub fn reward_carry_times2(level: u32) -> u64 {
    let lvl = level.max(1) as u64;
    let base = if lvl <= 4 {
        (8 + (lvl - 1) * 8) * 2
    } else if lvl <= 79 {
        64 + (lvl - 4)
    } else {
        130
    };
    (base + 20).min(196)
}

pub fn exterminator_bps(level: u32) -> u16 {
    if level % 10 == 4 && level != 4 {
        EXTERMINATOR_BOOSTED_BPS
    } else {
        EXTERMINATOR_BPS
    }
}

/// Per-beneficiary claimable balances. The Claimable pool covers these plus any unclaimed
/// claim-round reserves.
pub trait ClaimableLedger {
    fn credit(&mut self, owner: &Pubkey, amount: u64) -> Result<()>;
    /// Zeroes and returns the owner's balance.
    fn take(&mut self, owner: &Pubkey) -> Result<u64>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimableBook {
    balances: BTreeMap<Pubkey, u64>,
}

impl ClaimableBook {
    pub fn balance(&self, owner: &Pubkey) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn total(&self) -> Result<u64> {
        self.balances
            .values()
            .try_fold(0u64, |acc, v| checked_add_u64(acc, *v))
    }
}

impl ClaimableLedger for ClaimableBook {
    fn credit(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let slot = self.balances.entry(*owner).or_insert(0);
        *slot = checked_add_u64(*slot, amount)?;
        Ok(())
    }

    fn take(&mut self, owner: &Pubkey) -> Result<u64> {
        let amount = self.balances.remove(owner).unwrap_or(0);
        require!(amount > 0, ErrorCode::NothingToWithdraw);
        Ok(amount)
    }
}
