use anchor_lang::prelude::*;

use crate::constants::*;
use crate::engine::buckets::allocate;
use crate::engine::config::EngineConfig;
use crate::engine::decimator::{bucket_index, draw_winning_sub, ClaimRound, DecimatorRecords};
use crate::engine::entropy::Entropy;
use crate::engine::ledger::{PoolId, PoolLedger};
use crate::engine::resolver::{
    pay_winner, plan_tiers, resolve_winner_at, Payout, SettlementContext, TierPlan,
};
use crate::engine::rewards::PendingReward;
use crate::engine::tickets::{winning_categories, TicketSource};
use crate::errors::ErrorCode;
use crate::utils::{checked_add_u64, checked_sub_u64, round_down};

pub const RUN_KIND_COUNT: usize = 4;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunKind {
    /// Four tiers over the day's winning categories, paid from the current prize pool.
    Daily,
    /// Four tiers over the exterminated category, paid from the current prize pool.
    Extermination,
    /// Odds-based payout across every ticket of one category, paid from the reward pool.
    Scatter,
    /// Weight-class claim round, paid from the reward pool.
    Decimator,
}

impl RunKind {
    pub const ALL: [RunKind; RUN_KIND_COUNT] = [
        RunKind::Daily,
        RunKind::Extermination,
        RunKind::Scatter,
        RunKind::Decimator,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tag(self) -> &'static [u8] {
        match self {
            RunKind::Daily => b"jackpot:daily",
            RunKind::Extermination => b"jackpot:extermination",
            RunKind::Scatter => b"jackpot:scatter",
            RunKind::Decimator => b"jackpot:decimator",
        }
    }

    pub fn funding_pool(self) -> PoolId {
        match self {
            RunKind::Daily | RunKind::Extermination => PoolId::CurrentPrize,
            RunKind::Scatter | RunKind::Decimator => PoolId::Reward,
        }
    }

    pub fn is_tiered(self) -> bool {
        matches!(self, RunKind::Daily | RunKind::Extermination)
    }

    pub fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl TryFrom<u8> for RunKind {
    type Error = anchor_lang::error::Error;

    fn try_from(value: u8) -> Result<Self> {
        RunKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(ErrorCode::InvalidRunKind.into())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunPhase {
    #[default]
    NotStarted,
    ScanningPrimary,
    ScanningSecondary,
    Settling,
    Done,
}

/// Persisted state of one resumable run. The default value is an idle slot.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Debug, Default, PartialEq, Eq)]
pub struct JackpotRun {
    pub kind: u8,
    pub level: u32,
    pub in_progress: bool,
    pub total_pool_amount: u64,
    /// Known unspent amount: empty tiers and dust while running, the full remainder once settled.
    pub accumulated_return: u64,
    pub distributed: u64,
    pub bonded: u64,
    pub reserved: u64,
    pub phase: RunPhase,
    pub cursor: u32,
    pub scan_limit: u32,
    pub per_winner_amount: u64,
    pub seed: [u8; 32],
    pub entropy_state: Entropy,
    #[max_len(TIER_COUNT)]
    pub tiers: Vec<TierPlan>,
    pub scatter_category: u16,
    pub scatter_hits: u32,
    pub scatter_paid: u32,
    #[max_len(DECIMATOR_BUCKET_SLOTS)]
    pub bucket_weights: Vec<u64>,
    pub winning_subs: [u8; DECIMATOR_DENOM_COUNT],
    pub total_weight: u64,
}

impl JackpotRun {
    /// Pool amount not yet paid, routed or reserved.
    pub fn undistributed(&self) -> Result<u64> {
        let spent = checked_add_u64(checked_add_u64(self.distributed, self.bonded)?, self.reserved)?;
        checked_sub_u64(self.total_pool_amount, spent)
    }
}

pub fn base_entropy(seed: &[u8; 32], kind: RunKind, level: u32) -> Entropy {
    Entropy::derive(seed, kind.tag()).salted(level as u64, 3)
}

pub fn is_scatter_hit(base: &Entropy, index: u32, odds: u32) -> bool {
    base.fork(b"scatter:hit", index as u64).bounded(odds as u64) == Some(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunRequest {
    pub kind: u8,
    pub pool_amount: u64,
    /// `0` selects the configured default.
    pub work_budget: u32,
    pub level: u32,
    pub entropy_seed: [u8; 32],
}

/// Population a run reads: one level's tickets, the day's category counters, and the decimator
/// book for decimator runs.
pub struct Population<'a> {
    pub tickets: &'a dyn TicketSource,
    pub daily_counts: &'a [u32; CATEGORY_COUNT],
    pub exterminated: Option<u16>,
    pub decimator: Option<&'a mut dyn DecimatorRecords>,
}

impl<'a> Population<'a> {
    fn decimator(&mut self) -> Result<&mut (dyn DecimatorRecords + 'a)> {
        match self.decimator.as_mut() {
            Some(book) => Ok(&mut **book),
            None => err!(ErrorCode::MissingDecimatorBook),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub kind: RunKind,
    pub level: u32,
    pub finished: bool,
    pub phase_start: RunPhase,
    pub phase: RunPhase,
    pub cursor_start: u32,
    pub cursor_end: u32,
    pub work_used: u32,
    pub payouts: Vec<Payout>,
    pub bond_routed: u64,
    pub bond_outflow: u64,
    /// Returned to the funding pool. Only set on the finishing call.
    pub pool_remainder: u64,
    /// Moved into the Claimable pool behind a claim round. Only set on the finishing call.
    pub reserved_for_claims: u64,
}

impl RunOutcome {
    pub fn direct_total(&self) -> u64 {
        self.payouts.iter().map(|p| p.direct).sum()
    }
}

/// Opens the run for `req.kind` if idle, then advances it by at most the work budget.
pub fn start_or_resume(
    run: &mut JackpotRun,
    req: &RunRequest,
    pop: &mut Population<'_>,
    ctx: &mut SettlementContext<'_>,
) -> Result<RunOutcome> {
    let kind = RunKind::try_from(req.kind)?;
    if run.in_progress {
        require!(run.kind == req.kind, ErrorCode::InvalidRunKind);
        require!(run.level == req.level, ErrorCode::RunAlreadyInProgress);
        require!(
            run.total_pool_amount == req.pool_amount && run.seed == req.entropy_seed,
            ErrorCode::RunParamsMismatch
        );
    } else {
        open(run, kind, req, pop, ctx)?;
    }
    let budget = ctx.config.effective_budget(req.work_budget);
    advance(run, kind, budget, pop, ctx)
}

fn open(
    run: &mut JackpotRun,
    kind: RunKind,
    req: &RunRequest,
    pop: &mut Population<'_>,
    ctx: &mut SettlementContext<'_>,
) -> Result<()> {
    let base = base_entropy(&req.entropy_seed, kind, req.level);
    let mut next = JackpotRun {
        kind: req.kind,
        level: req.level,
        in_progress: true,
        total_pool_amount: req.pool_amount,
        phase: RunPhase::ScanningPrimary,
        seed: req.entropy_seed,
        entropy_state: base,
        ..JackpotRun::default()
    };

    match kind {
        RunKind::Daily | RunKind::Extermination => {
            let categories = if kind == RunKind::Daily {
                winning_categories(pop.daily_counts, &base)
            } else {
                [pop.exterminated.ok_or(ErrorCode::NoExterminatedCategory)?; TIER_COUNT]
            };
            let mut populations = [0u32; TIER_COUNT];
            for (p, c) in populations.iter_mut().zip(categories.iter()) {
                *p = pop.tickets.population(*c);
            }
            let alloc = allocate(req.pool_amount, &base, ctx.config, &populations)?;
            let (tiers, unspent) = plan_tiers(&alloc, &categories, &populations, &base)?;
            next.scan_limit = tiers.iter().map(|t| t.winner_count as u32).sum();
            next.accumulated_return = unspent;
            next.tiers = tiers;
        }
        RunKind::Scatter => {
            let category = winning_categories(pop.daily_counts, &base)[2];
            next.scatter_category = category;
            next.scan_limit = pop.tickets.population(category);
        }
        RunKind::Decimator => {
            let book = pop.decimator()?;
            require!(book.level() == req.level, ErrorCode::LevelMismatch);
            require!(!book.claim_round().active, ErrorCode::ClaimRoundExists);
            require!(!book.is_frozen(), ErrorCode::DecimatorFrozen);
            book.set_frozen(true);
            next.scan_limit = book.entry_count();
            next.bucket_weights = vec![0; DECIMATOR_BUCKET_SLOTS];
        }
    }

    ctx.ledger.debit(kind.funding_pool(), req.pool_amount)?;
    *run = next;
    Ok(())
}

fn advance(
    run: &mut JackpotRun,
    kind: RunKind,
    budget: u32,
    pop: &mut Population<'_>,
    ctx: &mut SettlementContext<'_>,
) -> Result<RunOutcome> {
    let mut out = RunOutcome {
        kind,
        level: run.level,
        finished: false,
        phase_start: run.phase,
        phase: run.phase,
        cursor_start: run.cursor,
        cursor_end: run.cursor,
        work_used: 0,
        payouts: Vec::new(),
        bond_routed: 0,
        bond_outflow: 0,
        pool_remainder: 0,
        reserved_for_claims: 0,
    };

    loop {
        match run.phase {
            RunPhase::NotStarted => run.phase = RunPhase::ScanningPrimary,
            RunPhase::ScanningPrimary => {
                if primary_done(run, kind, ctx.config) {
                    finish_primary(run, kind, ctx.config)?;
                    continue;
                }
                if out.work_used >= budget {
                    break;
                }
                primary_step(run, kind, pop, ctx, &mut out)?;
                out.work_used += 1;
            }
            RunPhase::ScanningSecondary => {
                if secondary_done(run, kind) {
                    run.phase = RunPhase::Settling;
                    run.cursor = 0;
                    continue;
                }
                if out.work_used >= budget {
                    break;
                }
                secondary_step(run, kind, pop, ctx, &mut out)?;
                out.work_used += 1;
            }
            RunPhase::Settling => {
                settle(run, kind, pop, ctx, &mut out)?;
                run.phase = RunPhase::Done;
            }
            RunPhase::Done => {
                out.finished = true;
                break;
            }
        }
    }

    out.phase = run.phase;
    out.cursor_end = run.cursor;
    out.bond_outflow = ctx.bond_outflow;
    if out.finished {
        *run = JackpotRun::default();
    }
    Ok(out)
}

fn primary_done(run: &JackpotRun, kind: RunKind, cfg: &EngineConfig) -> bool {
    if run.cursor >= run.scan_limit {
        return true;
    }
    kind == RunKind::Scatter && run.scatter_hits >= cfg.max_winners as u32
}

fn finish_primary(
    run: &mut JackpotRun,
    kind: RunKind,
    cfg: &EngineConfig,
) -> Result<()> {
    run.cursor = 0;
    run.phase = match kind {
        RunKind::Daily | RunKind::Extermination => RunPhase::Settling,
        RunKind::Scatter => {
            let per_winner = if run.scatter_hits == 0 {
                0
            } else {
                round_down(run.total_pool_amount / run.scatter_hits as u64, cfg.payout_unit)
            };
            run.per_winner_amount = per_winner;
            if per_winner == 0 {
                RunPhase::Settling
            } else {
                RunPhase::ScanningSecondary
            }
        }
        RunKind::Decimator => RunPhase::ScanningSecondary,
    };
    Ok(())
}

fn secondary_done(run: &JackpotRun, kind: RunKind) -> bool {
    match kind {
        RunKind::Scatter => run.scatter_paid >= run.scatter_hits || run.cursor >= run.scan_limit,
        RunKind::Decimator => run.cursor as usize >= DECIMATOR_DENOM_COUNT,
        _ => true,
    }
}

/// Maps the flat winner cursor of a tiered run to (tier, position within tier).
fn locate_winner(tiers: &[TierPlan], cursor: u32) -> Result<(usize, u16)> {
    let mut rest = cursor;
    for (i, t) in tiers.iter().enumerate() {
        let count = t.winner_count as u32;
        if rest < count {
            return Ok((i, rest as u16));
        }
        rest -= count;
    }
    err!(ErrorCode::RecordOutOfRange)
}

fn record_payout(run: &mut JackpotRun, out: &mut RunOutcome, payout: Payout) -> Result<()> {
    run.distributed = checked_add_u64(run.distributed, payout.direct)?;
    run.bonded = checked_add_u64(run.bonded, payout.bonded)?;
    out.bond_routed = checked_add_u64(out.bond_routed, payout.bonded)?;
    out.payouts.push(payout);
    Ok(())
}

fn primary_step(
    run: &mut JackpotRun,
    kind: RunKind,
    pop: &mut Population<'_>,
    ctx: &mut SettlementContext<'_>,
    out: &mut RunOutcome,
) -> Result<()> {
    match kind {
        RunKind::Daily | RunKind::Extermination => {
            let (tier, position) = locate_winner(&run.tiers, run.cursor)?;
            let plan = run.tiers[tier];
            // nothing may fail once the router has seen the payout
            if tier == SOLO_TIER {
                ctx.rewards.ensure_room()?;
            }
            let payout = resolve_winner_at(&plan, position, &mut run.entropy_state, pop.tickets, ctx)?;
            if tier == SOLO_TIER {
                ctx.rewards.enqueue(PendingReward {
                    beneficiary: payout.winner,
                    category: plan.category,
                    level: run.level,
                })?;
            }
            record_payout(run, out, payout)?;
        }
        RunKind::Scatter => {
            let base = base_entropy(&run.seed, kind, run.level);
            if is_scatter_hit(&base, run.cursor, ctx.config.scatter_odds) {
                run.scatter_hits += 1;
            }
        }
        RunKind::Decimator => {
            let entry = pop.decimator()?.entry_at(run.cursor)?;
            let slot = bucket_index(entry.denom, entry.sub)?;
            let weight = run
                .bucket_weights
                .get_mut(slot)
                .ok_or(ErrorCode::RecordOutOfRange)?;
            *weight = checked_add_u64(*weight, entry.weight)?;
        }
    }
    run.cursor += 1;
    Ok(())
}

fn secondary_step(
    run: &mut JackpotRun,
    kind: RunKind,
    pop: &mut Population<'_>,
    ctx: &mut SettlementContext<'_>,
    out: &mut RunOutcome,
) -> Result<()> {
    match kind {
        RunKind::Scatter => {
            let base = base_entropy(&run.seed, kind, run.level);
            if is_scatter_hit(&base, run.cursor, ctx.config.scatter_odds) {
                let winner = pop.tickets.ticket_at(run.scatter_category, run.cursor)?;
                let payout = pay_winner(ctx, winner, 0, run.per_winner_amount, 0)?;
                run.scatter_paid += 1;
                record_payout(run, out, payout)?;
            }
        }
        RunKind::Decimator => {
            let denom = DECIMATOR_MIN_DENOM + run.cursor as u8;
            let sub = draw_winning_sub(&base_entropy(&run.seed, kind, run.level), denom)?;
            run.winning_subs[run.cursor as usize] = sub;
            let weight = run
                .bucket_weights
                .get(bucket_index(denom, sub)?)
                .copied()
                .ok_or(ErrorCode::RecordOutOfRange)?;
            run.total_weight = checked_add_u64(run.total_weight, weight)?;
        }
        _ => return err!(ErrorCode::InvalidRunKind),
    }
    run.cursor += 1;
    Ok(())
}

fn settle(
    run: &mut JackpotRun,
    kind: RunKind,
    pop: &mut Population<'_>,
    ctx: &mut SettlementContext<'_>,
    out: &mut RunOutcome,
) -> Result<()> {
    if kind == RunKind::Decimator {
        let book = pop.decimator()?;
        if run.total_weight > 0 && run.total_pool_amount > 0 {
            *book.claim_round_mut() = ClaimRound {
                level: run.level,
                pool_amount: run.total_pool_amount,
                total_weight: run.total_weight,
                claimed_amount: 0,
                active: true,
                winning_subs: run.winning_subs,
            };
            ctx.ledger.credit(PoolId::Claimable, run.total_pool_amount)?;
            run.reserved = run.total_pool_amount;
            out.reserved_for_claims = run.total_pool_amount;
        } else {
            book.set_frozen(false);
        }
    }

    let remainder = run.undistributed()?;
    ctx.ledger.credit(kind.funding_pool(), remainder)?;
    run.accumulated_return = remainder;
    out.pool_remainder = remainder;
    Ok(())
}

/// Retires an in-progress run, refunding whatever it has not paid to its funding pool.
pub fn abort(
    run: &mut JackpotRun,
    decimator: Option<&mut dyn DecimatorRecords>,
    ledger: &mut PoolLedger,
) -> Result<u64> {
    require!(run.in_progress, ErrorCode::NoRunInProgress);
    let kind = RunKind::try_from(run.kind)?;
    if kind == RunKind::Decimator {
        let book = decimator.ok_or(ErrorCode::MissingDecimatorBook)?;
        book.set_frozen(false);
    }
    let refund = run.undistributed()?;
    ledger.credit(kind.funding_pool(), refund)?;
    *run = JackpotRun::default();
    Ok(refund)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bond::{DisabledBondRouter, RecordingBondRouter};
    use crate::engine::decimator::{record_burn, DecimatorBook};
    use crate::engine::ledger::ClaimableBook;
    use crate::engine::rewards::RewardQueue;
    use crate::engine::tickets::TicketBook;

    fn key(n: u32) -> Pubkey {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&n.to_le_bytes());
        bytes[31] = 1;
        Pubkey::new_from_array(bytes)
    }

    struct Harness {
        cfg: EngineConfig,
        ledger: PoolLedger,
        claimables: ClaimableBook,
        rewards: RewardQueue,
        tickets: TicketBook,
        run: JackpotRun,
    }

    impl Harness {
        fn new(pool: PoolId, amount: u64) -> Self {
            let mut ledger = PoolLedger::default();
            ledger.deposit(pool, amount).unwrap();
            Self {
                cfg: EngineConfig::default(),
                ledger,
                claimables: ClaimableBook::default(),
                rewards: RewardQueue::default(),
                tickets: TicketBook::default(),
                run: JackpotRun::default(),
            }
        }

        fn step(
            &mut self,
            req: &RunRequest,
            decimator: Option<&mut DecimatorBook>,
        ) -> Result<RunOutcome> {
            let mut router = DisabledBondRouter;
            let tickets = self.tickets.level(req.level);
            let mut pop = Population {
                tickets: &tickets,
                daily_counts: self.tickets.daily_counts(),
                exterminated: self.tickets.exterminated(req.level),
                decimator: decimator.map(|b| b as &mut dyn DecimatorRecords),
            };
            let mut ctx = SettlementContext {
                config: &self.cfg,
                ledger: &mut self.ledger,
                claimables: &mut self.claimables,
                rewards: &mut self.rewards,
                router: &mut router,
                bond_outflow: 0,
            };
            start_or_resume(&mut self.run, req, &mut pop, &mut ctx)
        }
    }

    fn request(kind: RunKind, pool: u64, budget: u32) -> RunRequest {
        RunRequest {
            kind: kind as u8,
            pool_amount: pool,
            work_budget: budget,
            level: 1,
            entropy_seed: [9u8; 32],
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut h = Harness::new(PoolId::Reward, 10);
        let mut req = request(RunKind::Scatter, 10, 0);
        req.kind = 4;
        assert_eq!(h.step(&req, None).unwrap_err(), ErrorCode::InvalidRunKind.into());
    }

    #[test]
    fn extermination_without_category_fails() {
        let mut h = Harness::new(PoolId::CurrentPrize, 10);
        let req = request(RunKind::Extermination, 10, 0);
        assert_eq!(
            h.step(&req, None).unwrap_err(),
            ErrorCode::NoExterminatedCategory.into()
        );
    }

    #[test]
    fn empty_population_refunds_on_first_call() {
        let mut h = Harness::new(PoolId::CurrentPrize, 1_000_000);
        h.tickets.mark_exterminated(1, 17).unwrap();
        let out = h.step(&request(RunKind::Extermination, 1_000_000, 1), None).unwrap();
        assert!(out.finished);
        assert!(out.payouts.is_empty());
        assert_eq!(out.pool_remainder, 1_000_000);
        assert_eq!(out.work_used, 0);
        assert_eq!(h.ledger.current_prize, 1_000_000);
        assert!(!h.run.in_progress);
    }

    #[test]
    fn resume_checks_level_and_params() {
        let mut h = Harness::new(PoolId::CurrentPrize, 1_000);
        h.tickets.insert_many(1, 5, &[key(1), key(2)]).unwrap();
        h.tickets.mark_exterminated(1, 5).unwrap();
        let req = request(RunKind::Extermination, 1_000, 1);
        let first = h.step(&req, None).unwrap();
        assert!(!first.finished);

        let mut other_level = req;
        other_level.level = 2;
        assert_eq!(
            h.step(&other_level, None).unwrap_err(),
            ErrorCode::RunAlreadyInProgress.into()
        );

        let mut other_pool = req;
        other_pool.pool_amount = 999;
        assert_eq!(
            h.step(&other_pool, None).unwrap_err(),
            ErrorCode::RunParamsMismatch.into()
        );
    }

    #[test]
    fn solo_winner_gets_a_deferred_reward() {
        let mut h = Harness::new(PoolId::CurrentPrize, 10_000);
        h.tickets.insert_many(1, 5, &[key(1)]).unwrap();
        h.tickets.mark_exterminated(1, 5).unwrap();
        let out = h.step(&request(RunKind::Extermination, 10_000, 0), None).unwrap();
        assert!(out.finished);
        assert_eq!(h.rewards.len(), 1);
        assert_eq!(h.rewards.items[0].beneficiary, key(1));
        assert_eq!(h.rewards.items[0].category, 5);
    }

    #[test]
    fn scatter_pays_only_hits() {
        let mut h = Harness::new(PoolId::Reward, 1_000_000);
        let ids: Vec<Pubkey> = (0..400).map(key).collect();
        // quadrant 2 winner is the most-burned category there
        h.tickets.insert_many(1, 130, &ids).unwrap();

        let req = request(RunKind::Scatter, 1_000_000, 10_000);
        let base = base_entropy(&req.entropy_seed, RunKind::Scatter, 1);
        let expected: Vec<Pubkey> = (0..400u32)
            .filter(|i| is_scatter_hit(&base, *i, h.cfg.scatter_odds))
            .map(key)
            .collect();

        let out = h.step(&req, None).unwrap();
        assert!(out.finished);
        let winners: Vec<Pubkey> = out.payouts.iter().map(|p| p.winner).collect();
        assert!(!expected.is_empty());
        assert_eq!(winners, expected);
        assert_eq!(out.direct_total() + out.pool_remainder, 1_000_000);
    }

    #[test]
    fn scatter_hit_rate_follows_odds() {
        let mut total = 0u32;
        for n in 0..64u8 {
            let base = base_entropy(&[n; 32], RunKind::Scatter, 1);
            let hits = (0..1_000u32).filter(|i| is_scatter_hit(&base, *i, 20)).count() as u32;
            // expected 50 per seed
            assert!((20..=90).contains(&hits), "seed {} hit {} times", n, hits);
            total += hits;
        }
        assert!((2_800..=3_600).contains(&total), "{}", total);
    }

    #[test]
    fn decimator_requires_book() {
        let mut h = Harness::new(PoolId::Reward, 100);
        assert_eq!(
            h.step(&request(RunKind::Decimator, 100, 0), None).unwrap_err(),
            ErrorCode::MissingDecimatorBook.into()
        );
    }

    #[test]
    fn decimator_reserves_pool_behind_claim_round() {
        let mut h = Harness::new(PoolId::Reward, 5_000);
        let mut book = DecimatorBook::new(1);
        for n in 0..60 {
            record_burn(&mut book, &key(n), 10 + n as u64, 2 + (n % 5) as u8).unwrap();
        }

        let out = h.step(&request(RunKind::Decimator, 5_000, 0), Some(&mut book)).unwrap();
        assert!(out.finished);
        let round = *book.claim_round();
        if out.reserved_for_claims > 0 {
            assert!(round.active);
            assert_eq!(round.pool_amount, 5_000);
            assert_eq!(h.ledger.claimable, 5_000);
            assert_eq!(h.ledger.reward, 0);
            let winners_weight: u64 = book
                .entries()
                .iter()
                .filter(|e| round.is_winner(e))
                .map(|e| e.weight)
                .sum();
            assert_eq!(winners_weight, round.total_weight);
        } else {
            assert_eq!(out.pool_remainder, 5_000);
            assert!(!book.is_frozen());
        }
        h.ledger.ensure_solvent().unwrap();
    }

    #[test]
    fn decimator_book_frozen_while_running() {
        let mut h = Harness::new(PoolId::Reward, 5_000);
        let mut book = DecimatorBook::new(1);
        for n in 0..10 {
            record_burn(&mut book, &key(n), 5, 4).unwrap();
        }
        let out = h.step(&request(RunKind::Decimator, 5_000, 3), Some(&mut book)).unwrap();
        assert!(!out.finished);
        assert!(book.is_frozen());
        assert_eq!(
            record_burn(&mut book, &key(99), 5, 4).unwrap_err(),
            ErrorCode::DecimatorFrozen.into()
        );

        let refund = abort(&mut h.run, Some(&mut book), &mut h.ledger).unwrap();
        assert_eq!(refund, 5_000);
        assert!(!book.is_frozen());
        assert_eq!(h.ledger.reward, 5_000);
        assert_eq!(
            abort(&mut h.run, Some(&mut book), &mut h.ledger).unwrap_err(),
            ErrorCode::NoRunInProgress.into()
        );
    }

    #[test]
    fn recording_router_sees_bond_window() {
        let cfg = EngineConfig::default();
        let mut tickets = TicketBook::default();
        tickets.insert_many(1, 7, &(0..50).map(key).collect::<Vec<_>>()).unwrap();
        tickets.mark_exterminated(1, 7).unwrap();
        let mut ledger = PoolLedger::default();
        ledger.deposit(PoolId::CurrentPrize, 1_000_000).unwrap();
        let mut claimables = ClaimableBook::default();
        let mut rewards = RewardQueue::default();
        let mut router = RecordingBondRouter::unlimited();
        let mut run = JackpotRun::default();

        let view = tickets.level(1);
        let mut pop = Population {
            tickets: &view,
            daily_counts: tickets.daily_counts(),
            exterminated: tickets.exterminated(1),
            decimator: None,
        };
        let mut ctx = SettlementContext {
            config: &cfg,
            ledger: &mut ledger,
            claimables: &mut claimables,
            rewards: &mut rewards,
            router: &mut router,
            bond_outflow: 0,
        };
        let out = start_or_resume(
            &mut run,
            &request(RunKind::Extermination, 1_000_000, 0),
            &mut pop,
            &mut ctx,
        )
        .unwrap();
        let outflow = ctx.bond_outflow;

        assert!(out.finished);
        // solo fraction plus bond_winner_count whole payouts in each of the three wide tiers
        assert_eq!(router.accepted.len(), 1 + 3 * cfg.bond_winner_count as usize);
        assert_eq!(out.bond_routed, router.total_accepted());
        assert_eq!(out.bond_outflow, outflow);
        assert_eq!(
            out.direct_total() + out.bond_routed + out.pool_remainder,
            1_000_000
        );
        ledger.ensure_solvent().unwrap();
    }
}
