use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::ErrorCode;

/// Distribution parameters shared by every run. Stored on the `Engine` account.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Share of the pool per tier before rotation. Must sum to 10_000.
    pub tier_shares_bps: [u16; TIER_COUNT],
    /// Winner counts per tier below `scale_floor`. The solo tier must be 1.
    pub base_winner_counts: [u16; TIER_COUNT],
    pub scale_floor: u64,
    pub scale_ceiling: u64,
    pub max_scale_bps: u32,
    pub max_winners: u16,
    pub payout_unit: u64,
    pub solo_bond_bps: u16,
    pub bond_winner_count: u16,
    pub bond_mirror_bps: u16,
    pub bond_reward_return_bps: u16,
    pub bond_routing_enabled: bool,
    /// Routes below this amount are rejected by the vault router and paid directly.
    pub bond_min_route: u64,
    pub scatter_odds: u32,
    pub default_work_budget: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tier_shares_bps: DEFAULT_TIER_SHARES_BPS,
            base_winner_counts: DEFAULT_BASE_WINNER_COUNTS,
            scale_floor: DEFAULT_SCALE_FLOOR,
            scale_ceiling: DEFAULT_SCALE_CEILING,
            max_scale_bps: DEFAULT_MAX_SCALE_BPS,
            max_winners: DEFAULT_MAX_WINNERS,
            payout_unit: DEFAULT_PAYOUT_UNIT,
            solo_bond_bps: DEFAULT_SOLO_BOND_BPS,
            bond_winner_count: DEFAULT_BOND_WINNER_COUNT,
            bond_mirror_bps: DEFAULT_BOND_MIRROR_BPS,
            bond_reward_return_bps: DEFAULT_BOND_REWARD_RETURN_BPS,
            bond_routing_enabled: true,
            bond_min_route: 0,
            scatter_odds: DEFAULT_SCATTER_ODDS,
            default_work_budget: DEFAULT_WORK_BUDGET,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let share_sum: u64 = self.tier_shares_bps.iter().map(|b| *b as u64).sum();
        require!(share_sum == BPS_DENOMINATOR, ErrorCode::InvalidConfig);
        require!(self.base_winner_counts[SOLO_TIER] == 1, ErrorCode::InvalidConfig);
        require!(self.scale_floor < self.scale_ceiling, ErrorCode::InvalidConfig);
        require!(self.max_scale_bps as u64 >= BPS_DENOMINATOR, ErrorCode::InvalidConfig);
        require!(self.max_winners as usize >= TIER_COUNT, ErrorCode::InvalidConfig);
        require!(self.payout_unit > 0, ErrorCode::InvalidConfig);
        require!(self.solo_bond_bps as u64 <= BPS_DENOMINATOR, ErrorCode::InvalidConfig);
        require!(
            self.bond_mirror_bps as u64 + self.bond_reward_return_bps as u64 <= BPS_DENOMINATOR,
            ErrorCode::InvalidConfig
        );
        require!(self.scatter_odds > 0, ErrorCode::InvalidConfig);
        require!(self.default_work_budget > 0, ErrorCode::InvalidConfig);
        Ok(())
    }

    /// `0` selects the configured default.
    pub fn effective_budget(&self, requested: u32) -> u32 {
        if requested == 0 {
            self.default_work_budget
        } else {
            requested
        }
    }
}
