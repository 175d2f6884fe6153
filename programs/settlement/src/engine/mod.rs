//! Settlement core. Everything here is plain state and arithmetic; the instruction handlers load
//! accounts, call into these modules and move tokens.

pub mod bond;
pub mod buckets;
pub mod config;
pub mod decimator;
pub mod entropy;
pub mod ledger;
pub mod resolver;
pub mod rewards;
pub mod scan;
pub mod tickets;

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::errors::ErrorCode;
use crate::utils::mul_bps;
use bond::BondRouter;
use config::EngineConfig;
use decimator::{DecimatorBook, DecimatorEntry, DecimatorRecords};
use ledger::{exterminator_bps, ClaimableBook, ClaimableLedger, LevelRotation, PoolId, PoolLedger};
use resolver::SettlementContext;
use rewards::{PendingReward, RewardQueue};
use scan::{JackpotRun, Population, RunKind, RunOutcome, RunRequest, RUN_KIND_COUNT};
use tickets::TicketBook;

/// Owned engine state for host-side settlement. Every entry point either commits all of its
/// mutations or none of them.
#[derive(Clone, Debug)]
pub struct EngineState {
    pub config: EngineConfig,
    pub level: u32,
    pub ledger: PoolLedger,
    pub claimables: ClaimableBook,
    pub tickets: TicketBook,
    pub decimators: BTreeMap<u32, DecimatorBook>,
    pub runs: [JackpotRun; RUN_KIND_COUNT],
    pub rewards: RewardQueue,
}

impl EngineState {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            level: 1,
            ledger: PoolLedger::default(),
            claimables: ClaimableBook::default(),
            tickets: TicketBook::default(),
            decimators: BTreeMap::new(),
            runs: Default::default(),
            rewards: RewardQueue::default(),
        })
    }

    pub fn run(&self, kind: RunKind) -> &JackpotRun {
        &self.runs[kind.index()]
    }

    pub fn has_run_in_progress(&self) -> bool {
        self.runs.iter().any(|r| r.in_progress)
    }

    /// Fresh funds into a named pool. Claimable is only ever credited by payouts.
    pub fn deposit(&mut self, pool: PoolId, amount: u64) -> Result<()> {
        require!(pool != PoolId::Claimable, ErrorCode::InvalidPool);
        let mut ledger = self.ledger;
        ledger.deposit(pool, amount)?;
        ledger.ensure_solvent()?;
        self.ledger = ledger;
        Ok(())
    }

    pub fn add_tickets(&mut self, level: u32, category: u16, ids: &[Pubkey]) -> Result<()> {
        self.tickets.insert_many(level, category, ids)
    }

    pub fn record_decimator_burn(
        &mut self,
        level: u32,
        participant: &Pubkey,
        weight: u64,
        denom: u8,
    ) -> Result<DecimatorEntry> {
        let book = self
            .decimators
            .entry(level)
            .or_insert_with(|| DecimatorBook::new(level));
        decimator::record_burn(book, participant, weight, denom)
    }

    /// Marks the level's exterminated category and pays the exterminator their cut of the
    /// current prize pool. Returns the cut.
    pub fn mark_exterminated(
        &mut self,
        level: u32,
        category: u16,
        exterminator: &Pubkey,
    ) -> Result<u64> {
        require!(level == self.level, ErrorCode::LevelMismatch);
        let mut ledger = self.ledger;
        let cut = mul_bps(ledger.current_prize, exterminator_bps(level) as u64)?;
        ledger.transfer(PoolId::CurrentPrize, PoolId::Claimable, cut)?;
        ledger.ensure_solvent()?;

        self.tickets.mark_exterminated(level, category)?;
        self.claimables.credit(exterminator, cut)?;
        self.ledger = ledger;
        Ok(cut)
    }

    /// Pool amount for the `day`-th daily jackpot of the current level.
    pub fn daily_pool_amount(&self, day: u8) -> Result<u64> {
        self.ledger.daily_slice(day)
    }

    pub fn advance_level(&mut self, new_level: u32) -> Result<LevelRotation> {
        require!(new_level > self.level, ErrorCode::LevelMismatch);
        require!(!self.has_run_in_progress(), ErrorCode::RunsInProgress);
        let mut ledger = self.ledger;
        let rotation = ledger.rotate_level(new_level)?;
        ledger.ensure_solvent()?;

        self.ledger = ledger;
        self.tickets.reset_daily_counts();
        self.level = new_level;
        Ok(rotation)
    }

    /// Drops a finished level's ticket pools.
    pub fn clear_level_tickets(&mut self, level: u32) -> Result<usize> {
        require!(level < self.level, ErrorCode::LevelStillActive);
        require!(
            !self.runs.iter().any(|r| r.in_progress && r.level == level),
            ErrorCode::RunsInProgress
        );
        Ok(self.tickets.clear_level(level))
    }

    pub fn start_or_resume_run(
        &mut self,
        req: &RunRequest,
        router: &mut dyn BondRouter,
    ) -> Result<RunOutcome> {
        let kind = RunKind::try_from(req.kind)?;

        let mut ledger = self.ledger;
        let mut claimables = self.claimables.clone();
        let mut rewards = self.rewards.clone();
        let mut run = self.runs[kind.index()].clone();

        // Entries are read-only during a run; only the freeze flag and claim round change.
        let book = if kind == RunKind::Decimator {
            Some(
                self.decimators
                    .entry(req.level)
                    .or_insert_with(|| DecimatorBook::new(req.level)),
            )
        } else {
            None
        };
        let saved = book.as_ref().map(|b| (b.is_frozen(), *b.claim_round()));

        let tickets = self.tickets.level(req.level);
        let result = {
            let mut pop = Population {
                tickets: &tickets,
                daily_counts: self.tickets.daily_counts(),
                exterminated: self.tickets.exterminated(req.level),
                decimator: book.map(|b| b as &mut dyn DecimatorRecords),
            };
            let mut ctx = SettlementContext {
                config: &self.config,
                ledger: &mut ledger,
                claimables: &mut claimables,
                rewards: &mut rewards,
                router,
                bond_outflow: 0,
            };
            scan::start_or_resume(&mut run, req, &mut pop, &mut ctx)
        }
        .and_then(|out| {
            ledger.ensure_solvent()?;
            Ok(out)
        });

        match result {
            Ok(out) => {
                self.ledger = ledger;
                self.claimables = claimables;
                self.rewards = rewards;
                self.runs[kind.index()] = run;
                Ok(out)
            }
            Err(e) => {
                if let Some((frozen, round)) = saved {
                    if let Some(book) = self.decimators.get_mut(&req.level) {
                        book.set_frozen(frozen);
                        *book.claim_round_mut() = round;
                    }
                }
                Err(e)
            }
        }
    }

    /// Moves the claimant's share of the level's claim round into their claimable balance.
    pub fn claim(&mut self, level: u32, claimant: &Pubkey) -> Result<u64> {
        let book = self
            .decimators
            .get_mut(&level)
            .ok_or(ErrorCode::ClaimRoundInactive)?;
        let amount = decimator::claim_amount(&*book, claimant)?;
        let mut claimables = self.claimables.clone();
        claimables.credit(claimant, amount)?;

        decimator::claim(book, claimant)?;
        self.claimables = claimables;
        Ok(amount)
    }

    /// Pays out the owner's whole claimable balance.
    pub fn withdraw(&mut self, owner: &Pubkey) -> Result<u64> {
        let amount = self.claimables.balance(owner);
        require!(amount > 0, ErrorCode::NothingToWithdraw);
        let mut ledger = self.ledger;
        ledger.release(PoolId::Claimable, amount)?;
        ledger.ensure_solvent()?;

        self.claimables.take(owner)?;
        self.ledger = ledger;
        Ok(amount)
    }

    /// Closes a claim round and returns what nobody claimed to the reward pool.
    pub fn prune_claim_round(&mut self, level: u32) -> Result<u64> {
        let book = self
            .decimators
            .get_mut(&level)
            .ok_or(ErrorCode::ClaimRoundInactive)?;
        require!(book.claim_round().active, ErrorCode::ClaimRoundInactive);
        let mut ledger = self.ledger;
        ledger.transfer(PoolId::Claimable, PoolId::Reward, book.claim_round().unclaimed()?)?;
        ledger.ensure_solvent()?;

        let unclaimed = decimator::close_round(book)?;
        self.ledger = ledger;
        Ok(unclaimed)
    }

    /// Abandons a run and refunds its undistributed pool.
    pub fn abort_run(&mut self, kind: u8) -> Result<u64> {
        let kind = RunKind::try_from(kind)?;
        let mut ledger = self.ledger;
        let mut run = self.runs[kind.index()].clone();
        require!(run.in_progress, ErrorCode::NoRunInProgress);

        let book = if kind == RunKind::Decimator {
            self.decimators
                .get_mut(&run.level)
                .map(|b| b as &mut dyn DecimatorRecords)
        } else {
            None
        };
        let refund = scan::abort(&mut run, book, &mut ledger)?;
        ledger.ensure_solvent()?;

        self.ledger = ledger;
        self.runs[kind.index()] = run;
        Ok(refund)
    }

    pub fn drain_rewards(&mut self, max: usize) -> Vec<PendingReward> {
        self.rewards.drain(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bond::{DisabledBondRouter, RecordingBondRouter};

    fn key(n: u32) -> Pubkey {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&n.to_le_bytes());
        bytes[31] = 2;
        Pubkey::new_from_array(bytes)
    }

    fn request(kind: RunKind, pool: u64, budget: u32, level: u32) -> RunRequest {
        RunRequest {
            kind: kind as u8,
            pool_amount: pool,
            work_budget: budget,
            level,
            entropy_seed: [3u8; 32],
        }
    }

    fn engine() -> EngineState {
        EngineState::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = EngineConfig {
            payout_unit: 0,
            ..EngineConfig::default()
        };
        assert_eq!(EngineState::new(cfg).unwrap_err(), ErrorCode::InvalidConfig.into());
    }

    #[test]
    fn claimable_pool_is_not_a_deposit_target() {
        let mut e = engine();
        assert_eq!(
            e.deposit(PoolId::Claimable, 10).unwrap_err(),
            ErrorCode::InvalidPool.into()
        );
        e.deposit(PoolId::Reward, 10).unwrap();
        assert_eq!(e.ledger.assets_held, 10);
    }

    #[test]
    fn failed_run_leaves_state_untouched() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 100).unwrap();
        let before = e.ledger;
        // more than the pool holds
        let req = request(RunKind::Daily, 1_000, 0, 1);
        assert_eq!(
            e.start_or_resume_run(&req, &mut DisabledBondRouter).unwrap_err(),
            ErrorCode::PoolUnderflow.into()
        );
        assert_eq!(e.ledger, before);
        assert!(!e.has_run_in_progress());
    }

    #[test]
    fn failed_decimator_open_restores_book() {
        let mut e = engine();
        e.deposit(PoolId::Reward, 50).unwrap();
        e.record_decimator_burn(1, &key(1), 10, 3).unwrap();
        let req = request(RunKind::Decimator, 500, 0, 1);
        assert!(e.start_or_resume_run(&req, &mut DisabledBondRouter).is_err());
        assert!(!e.decimators[&1].is_frozen());
        e.record_decimator_burn(1, &key(2), 10, 3).unwrap();
    }

    #[test]
    fn extermination_pays_cut_and_blocks_second_mark() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 10_000).unwrap();
        let cut = e.mark_exterminated(1, 9, &key(7)).unwrap();
        assert_eq!(cut, 3_000);
        assert_eq!(e.ledger.current_prize, 7_000);
        assert_eq!(e.ledger.claimable, 3_000);
        assert_eq!(e.claimables.balance(&key(7)), 3_000);
        assert_eq!(
            e.mark_exterminated(1, 10, &key(7)).unwrap_err(),
            ErrorCode::AlreadyExterminated.into()
        );
        assert_eq!(
            e.mark_exterminated(2, 10, &key(7)).unwrap_err(),
            ErrorCode::LevelMismatch.into()
        );
    }

    #[test]
    fn level_cannot_advance_during_a_run() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 1_000).unwrap();
        let ids: Vec<Pubkey> = (0..20).map(key).collect();
        e.add_tickets(1, 4, &ids).unwrap();
        e.mark_exterminated(1, 4, &key(99)).unwrap();
        let pool = e.ledger.current_prize;
        let out = e
            .start_or_resume_run(&request(RunKind::Extermination, pool, 1, 1), &mut DisabledBondRouter)
            .unwrap();
        assert!(!out.finished);
        assert_eq!(e.advance_level(2).unwrap_err(), ErrorCode::RunsInProgress.into());

        let refund = e.abort_run(RunKind::Extermination as u8).unwrap();
        assert_eq!(refund, pool - out.direct_total());
        assert_eq!(e.advance_level(1).unwrap_err(), ErrorCode::LevelMismatch.into());
        e.advance_level(2).unwrap();
        assert_eq!(e.level, 2);
        assert!(e.tickets.daily_counts().iter().all(|c| *c == 0));
        e.ledger.ensure_solvent().unwrap();
    }

    #[test]
    fn old_level_tickets_can_be_cleared() {
        let mut e = engine();
        e.add_tickets(1, 4, &[key(1), key(2)]).unwrap();
        assert_eq!(e.clear_level_tickets(1).unwrap_err(), ErrorCode::LevelStillActive.into());
        e.advance_level(2).unwrap();
        assert_eq!(e.clear_level_tickets(1).unwrap(), 1);
        assert!(e.tickets.pool(1, 4).is_none());
    }

    #[test]
    fn withdraw_empties_balance() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 1_000).unwrap();
        e.mark_exterminated(1, 0, &key(5)).unwrap();
        assert_eq!(e.withdraw(&key(5)).unwrap(), 300);
        assert_eq!(e.ledger.assets_held, 700);
        assert_eq!(e.withdraw(&key(5)).unwrap_err(), ErrorCode::NothingToWithdraw.into());
        e.ledger.ensure_solvent().unwrap();
    }

    #[test]
    fn decimator_claims_then_prune() {
        let mut e = engine();
        e.deposit(PoolId::Reward, 90_000).unwrap();
        for n in 0..40 {
            e.record_decimator_burn(1, &key(n), 100 + n as u64, 2).unwrap();
        }
        let out = e
            .start_or_resume_run(&request(RunKind::Decimator, 90_000, 0, 1), &mut DisabledBondRouter)
            .unwrap();
        assert!(out.finished);
        assert_eq!(out.reserved_for_claims, 90_000);

        let round = *e.decimators[&1].claim_round();
        let winners: Vec<Pubkey> = e.decimators[&1]
            .entries()
            .iter()
            .filter(|x| round.is_winner(x))
            .map(|x| x.participant)
            .collect();
        assert!(!winners.is_empty());

        let first = e.claim(1, &winners[0]).unwrap();
        assert!(first > 0);
        assert_eq!(e.claim(1, &winners[0]).unwrap_err(), ErrorCode::AlreadyClaimed.into());
        assert_eq!(e.withdraw(&winners[0]).unwrap(), first);

        let unclaimed = e.prune_claim_round(1).unwrap();
        assert_eq!(unclaimed, 90_000 - first);
        assert_eq!(e.ledger.reward, unclaimed);
        assert_eq!(e.ledger.claimable, 0);
        assert_eq!(e.prune_claim_round(1).unwrap_err(), ErrorCode::ClaimRoundInactive.into());
        e.ledger.ensure_solvent().unwrap();
    }

    #[test]
    fn claim_that_cannot_be_credited_stays_unclaimed() {
        let mut e = engine();
        e.deposit(PoolId::Reward, 90_000).unwrap();
        for n in 0..40 {
            e.record_decimator_burn(1, &key(n), 100 + n as u64, 2).unwrap();
        }
        e.start_or_resume_run(&request(RunKind::Decimator, 90_000, 0, 1), &mut DisabledBondRouter)
            .unwrap();
        let round = *e.decimators[&1].claim_round();
        let winner = e.decimators[&1]
            .entries()
            .iter()
            .find(|x| round.is_winner(x))
            .map(|x| x.participant)
            .unwrap();

        e.claimables.credit(&winner, u64::MAX).unwrap();
        assert_eq!(e.claim(1, &winner).unwrap_err(), ErrorCode::MathOverflow.into());
        assert_eq!(e.decimators[&1].claim_round().claimed_amount, 0);
        let entry = e.decimators[&1]
            .entries()
            .iter()
            .find(|x| x.participant == winner)
            .copied()
            .unwrap();
        assert!(!entry.claimed);
        assert_eq!(e.claimables.balance(&winner), u64::MAX);
    }

    #[test]
    fn full_reward_queue_fails_before_any_route() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 1_000_000).unwrap();
        let ids: Vec<Pubkey> = (0..30).map(key).collect();
        e.add_tickets(1, 12, &ids).unwrap();
        e.mark_exterminated(1, 12, &key(500)).unwrap();
        for n in 0..crate::constants::REWARD_QUEUE_CAPACITY as u32 {
            e.rewards
                .enqueue(PendingReward {
                    beneficiary: key(n),
                    category: 0,
                    level: 1,
                })
                .unwrap();
        }
        let before = e.ledger;
        let pool = e.ledger.current_prize;
        let req = request(RunKind::Extermination, pool, 0, 1);
        let mut router = RecordingBondRouter::unlimited();

        assert_eq!(
            e.start_or_resume_run(&req, &mut router).unwrap_err(),
            ErrorCode::RewardQueueFull.into()
        );
        assert!(router.accepted.is_empty());
        assert_eq!(e.ledger, before);
        assert!(!e.has_run_in_progress());

        e.drain_rewards(crate::constants::REWARD_QUEUE_CAPACITY);
        let out = e.start_or_resume_run(&req, &mut router).unwrap();
        assert!(out.finished);
        assert!(out.bond_routed > 0);
        assert_eq!(router.total_accepted(), out.bond_routed);
    }

    #[test]
    fn routed_bonds_leave_custody() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 1_000_000).unwrap();
        let ids: Vec<Pubkey> = (0..30).map(key).collect();
        e.add_tickets(1, 12, &ids).unwrap();
        e.mark_exterminated(1, 12, &key(500)).unwrap();
        let pool = e.ledger.current_prize;
        let mut router = RecordingBondRouter::unlimited();
        let out = e
            .start_or_resume_run(&request(RunKind::Extermination, pool, 0, 1), &mut router)
            .unwrap();
        assert!(out.finished);
        assert!(out.bond_outflow > 0);
        assert_eq!(e.ledger.assets_held, 1_000_000 - out.bond_outflow);
        assert_eq!(e.drain_rewards(10).len(), 1);
        assert!(e.rewards.is_empty());
        e.ledger.ensure_solvent().unwrap();
    }

    #[test]
    fn daily_pool_tracks_current_prize() {
        let mut e = engine();
        e.deposit(PoolId::CurrentPrize, 100_000).unwrap();
        assert_eq!(e.daily_pool_amount(0).unwrap(), 6_100);
        assert_eq!(e.daily_pool_amount(200).unwrap(), 12_250);
    }
}
