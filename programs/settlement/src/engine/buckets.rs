use anchor_lang::prelude::*;

use crate::constants::{BPS_DENOMINATOR, SOLO_TIER, TIER_COUNT};
use crate::engine::config::EngineConfig;
use crate::engine::entropy::Entropy;
use crate::errors::ErrorCode;
use crate::utils::{checked_add_u64, checked_sub_u64, mul_bps, mul_div, round_down};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierAllocation {
    pub share_bps: u16,
    pub winner_count: u16,
    pub share: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketPlan {
    pub rotation: u8,
    pub tiers: [TierAllocation; TIER_COUNT],
}

impl BucketPlan {
    pub fn total_share(&self) -> Result<u64> {
        self.tiers
            .iter()
            .try_fold(0u64, |acc, t| checked_add_u64(acc, t.share))
    }
}

pub fn rotation_offset(entropy: &Entropy) -> usize {
    (entropy.low_u64() % TIER_COUNT as u64) as usize
}

pub fn rotated_shares(cfg: &EngineConfig, offset: usize) -> [u16; TIER_COUNT] {
    let mut out = [0u16; TIER_COUNT];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = cfg.tier_shares_bps[(i + offset) % TIER_COUNT];
    }
    out
}

/// Winner-count multiplier in bps: flat below the floor, `max_scale_bps` above the ceiling,
/// linear in between.
pub fn scale_bps(cfg: &EngineConfig, pool_amount: u64) -> Result<u64> {
    let max = cfg.max_scale_bps as u64;
    if pool_amount <= cfg.scale_floor {
        return Ok(BPS_DENOMINATOR);
    }
    if pool_amount >= cfg.scale_ceiling {
        return Ok(max);
    }
    let span = checked_sub_u64(cfg.scale_ceiling, cfg.scale_floor)?;
    let progress = checked_sub_u64(pool_amount, cfg.scale_floor)?;
    let extra = mul_div(checked_sub_u64(max, BPS_DENOMINATOR)?, progress, span)?;
    checked_add_u64(BPS_DENOMINATOR, extra)
}

/// Per-tier winner counts after size scaling and the global cap, before the population clamp.
pub fn scaled_counts(cfg: &EngineConfig, pool_amount: u64) -> Result<[u16; TIER_COUNT]> {
    let scale = scale_bps(cfg, pool_amount)?;
    let mut counts = [0u32; TIER_COUNT];
    for (i, count) in counts.iter_mut().enumerate() {
        let base = cfg.base_winner_counts[i] as u64;
        *count = if i == SOLO_TIER {
            1
        } else if base == 0 {
            0
        } else {
            mul_div(base, scale, BPS_DENOMINATOR)?.clamp(1, u16::MAX as u64) as u32
        };
    }

    let budget = (cfg.max_winners as u32).saturating_sub(1);
    let non_solo = |c: &[u32; TIER_COUNT]| -> u32 {
        c.iter()
            .enumerate()
            .filter(|(i, _)| *i != SOLO_TIER)
            .map(|(_, v)| *v)
            .sum()
    };

    let total = non_solo(&counts);
    if total > budget {
        for (i, count) in counts.iter_mut().enumerate() {
            if i != SOLO_TIER && *count > 0 {
                *count = ((*count as u64 * budget as u64) / total as u64).max(1) as u32;
            }
        }
        while non_solo(&counts) > budget {
            let (largest, value) = counts
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != SOLO_TIER)
                .max_by_key(|(_, v)| **v)
                .map(|(i, v)| (i, *v))
                .ok_or(ErrorCode::InvalidConfig)?;
            require!(value > 1, ErrorCode::InvalidConfig);
            counts[largest] -= 1;
        }
    }

    let mut out = [0u16; TIER_COUNT];
    for (o, c) in out.iter_mut().zip(counts.iter()) {
        *o = *c as u16;
    }
    Ok(out)
}

/// Splits `pool_amount` across the tiers. Non-solo shares are rounded down to a multiple of
/// `payout_unit * winner_count`; the solo tier takes the exact remainder so the shares always
/// sum to the pool.
pub fn allocate(
    pool_amount: u64,
    entropy: &Entropy,
    cfg: &EngineConfig,
    populations: &[u32; TIER_COUNT],
) -> Result<BucketPlan> {
    let rotation = rotation_offset(entropy);
    let shares_bps = rotated_shares(cfg, rotation);
    let counts = scaled_counts(cfg, pool_amount)?;

    let mut plan = BucketPlan {
        rotation: rotation as u8,
        ..BucketPlan::default()
    };
    let mut others = 0u64;
    for i in 0..TIER_COUNT {
        let count = (counts[i] as u32).min(populations[i]) as u16;
        plan.tiers[i].share_bps = shares_bps[i];
        plan.tiers[i].winner_count = count;
        if i == SOLO_TIER {
            continue;
        }
        let granule = cfg
            .payout_unit
            .checked_mul(count.max(1) as u64)
            .ok_or(ErrorCode::MathOverflow)?;
        let share = round_down(mul_bps(pool_amount, shares_bps[i] as u64)?, granule);
        plan.tiers[i].share = share;
        others = checked_add_u64(others, share)?;
    }
    plan.tiers[SOLO_TIER].share = checked_sub_u64(pool_amount, others)?;
    Ok(plan)
}
