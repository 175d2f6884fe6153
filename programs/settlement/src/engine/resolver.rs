use anchor_lang::prelude::*;

use crate::constants::TIER_COUNT;
use crate::engine::bond::BondRouter;
use crate::engine::buckets::BucketPlan;
use crate::engine::config::EngineConfig;
use crate::engine::entropy::Entropy;
use crate::engine::ledger::{ClaimableLedger, PoolId, PoolLedger};
use crate::engine::rewards::RewardQueue;
use crate::engine::tickets::TicketSource;
use crate::errors::ErrorCode;
use crate::utils::{checked_add_u64, checked_sub_u64, mul_bps};

/// Everything a payout touches. The caller owns the borrows for the length of one invocation.
pub struct SettlementContext<'a> {
    pub config: &'a EngineConfig,
    pub ledger: &'a mut PoolLedger,
    pub claimables: &'a mut dyn ClaimableLedger,
    pub rewards: &'a mut RewardQueue,
    pub router: &'a mut dyn BondRouter,
    /// Accepted bond routes net of what stays in custody. Moved to the bond vault by the caller.
    pub bond_outflow: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Payout {
    pub winner: Pubkey,
    pub tier: u8,
    pub direct: u64,
    pub bonded: u64,
}

impl Payout {
    pub fn total(&self) -> u64 {
        self.direct.saturating_add(self.bonded)
    }
}

/// One tier of a tiered run, fixed when the run opens.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierPlan {
    pub tier: u8,
    pub category: u16,
    pub share: u64,
    pub winner_count: u16,
    pub per_winner: u64,
    /// Ticket count when the run opened. Later appends are never drawn.
    pub population: u32,
    pub bond_offset: u16,
}

/// Builds the tier plans for an allocation. Returns the plans and the amount that will not be
/// paid out: shares of empty tiers and per-winner division dust.
pub fn plan_tiers(
    alloc: &BucketPlan,
    categories: &[u16; TIER_COUNT],
    populations: &[u32; TIER_COUNT],
    base: &Entropy,
) -> Result<(Vec<TierPlan>, u64)> {
    let mut plans = Vec::with_capacity(TIER_COUNT);
    let mut unspent = 0u64;
    for (i, t) in alloc.tiers.iter().enumerate() {
        let mut plan = TierPlan {
            tier: i as u8,
            category: categories[i],
            share: t.share,
            population: populations[i],
            ..TierPlan::default()
        };
        if t.share == 0 || t.winner_count == 0 {
            unspent = checked_add_u64(unspent, t.share)?;
        } else {
            let count = t.winner_count as u64;
            plan.winner_count = t.winner_count;
            plan.per_winner = t.share / count;
            let dust = checked_sub_u64(t.share, plan.per_winner * count)?;
            unspent = checked_add_u64(unspent, dust)?;
            plan.bond_offset = base
                .fork(b"bond:window", i as u64)
                .bounded(count)
                .unwrap_or(0) as u16;
        }
        plans.push(plan);
    }
    Ok((plans, unspent))
}

/// Draws one ticket index with replacement from the plan's population snapshot.
pub fn draw_winner(plan: &TierPlan, state: &mut Entropy, tickets: &dyn TicketSource) -> Result<Pubkey> {
    *state = state.step();
    let index = state
        .salted(plan.category as u64, 2)
        .salted(200 + plan.tier as u64, 3)
        .bounded(plan.population as u64)
        .ok_or(ErrorCode::RecordOutOfRange)?;
    tickets.ticket_at(plan.category, index as u32)
}

/// Portion of the winner at `position` offered to the bond router. A single-winner tier routes a
/// fraction; wider tiers route whole payouts for a rotating window of `bond_winner_count` winners.
pub fn bond_request(plan: &TierPlan, position: u16, cfg: &EngineConfig) -> Result<u64> {
    match plan.winner_count {
        0 => Ok(0),
        1 => mul_bps(plan.per_winner, cfg.solo_bond_bps as u64),
        count => {
            let rel = (position as u32 + count as u32 - plan.bond_offset as u32) % count as u32;
            if rel < cfg.bond_winner_count as u32 {
                Ok(plan.per_winner)
            } else {
                Ok(0)
            }
        }
    }
}

/// Credits `amount` to `winner`, offering `bond` of it to the router first. A rejected route is
/// paid directly.
pub fn pay_winner(
    ctx: &mut SettlementContext<'_>,
    winner: Pubkey,
    tier: u8,
    amount: u64,
    bond: u64,
) -> Result<Payout> {
    let mut bonded = 0u64;
    if bond > 0 {
        // settle on a copy first so an accepted route is always booked
        let mut staged = *ctx.ledger;
        let settled = staged.settle_bond_route(bond, ctx.config)?;
        let outflow = checked_add_u64(ctx.bond_outflow, settled.outflow)?;
        match ctx.router.try_route(&winner, bond) {
            Ok(()) => {
                *ctx.ledger = staged;
                ctx.bond_outflow = outflow;
                bonded = bond;
            }
            Err(e) => {
                msg!("bond route {:?} for {}: crediting {} directly", e, winner, bond);
            }
        }
    }

    let direct = checked_sub_u64(amount, bonded)?;
    ctx.claimables.credit(&winner, direct)?;
    ctx.ledger.credit(PoolId::Claimable, direct)?;
    Ok(Payout {
        winner,
        tier,
        direct,
        bonded,
    })
}

pub fn resolve_winner_at(
    plan: &TierPlan,
    position: u16,
    state: &mut Entropy,
    tickets: &dyn TicketSource,
    ctx: &mut SettlementContext<'_>,
) -> Result<Payout> {
    let winner = draw_winner(plan, state, tickets)?;
    let bond = bond_request(plan, position, ctx.config)?;
    pay_winner(ctx, winner, plan.tier, plan.per_winner, bond)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TierResult {
    pub payouts: Vec<Payout>,
    pub per_winner: u64,
    pub bond_spent: u64,
    pub entropy: Entropy,
}

/// Resolves a whole tier in one pass.
pub fn resolve_winners(
    plan: &TierPlan,
    entropy: Entropy,
    tickets: &dyn TicketSource,
    ctx: &mut SettlementContext<'_>,
) -> Result<TierResult> {
    let mut result = TierResult {
        per_winner: plan.per_winner,
        entropy,
        ..TierResult::default()
    };
    if plan.share == 0 || plan.winner_count == 0 {
        return Ok(result);
    }
    for position in 0..plan.winner_count {
        let payout = resolve_winner_at(plan, position, &mut result.entropy, tickets, ctx)?;
        result.bond_spent = checked_add_u64(result.bond_spent, payout.bonded)?;
        result.payouts.push(payout);
    }
    Ok(result)
}
