use std::collections::BTreeMap;

use anchor_lang::prelude::Pubkey;

use jackpot_settlement::{
    constants::{CATEGORY_COUNT, DECIMATOR_DENOM_COUNT, DECIMATOR_MIN_DENOM, SOLO_TIER, TIER_COUNT},
    engine::{
        bond::{BondRouter, DisabledBondRouter, RecordingBondRouter},
        buckets::{allocate, rotated_shares},
        config::EngineConfig,
        decimator::{DecimatorEntry, DecimatorRecords},
        entropy::Entropy,
        ledger::PoolId,
        scan::{RunKind, RunOutcome, RunPhase, RunRequest},
        EngineState,
    },
    errors::ErrorCode,
};

const SEED: [u8; 32] = [0x5a; 32];

fn participant(n: u32) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&n.to_be_bytes());
    bytes[31] = 0xee;
    Pubkey::new_from_array(bytes)
}

fn request(kind: RunKind, pool_amount: u64, work_budget: u32) -> RunRequest {
    RunRequest {
        kind: kind as u8,
        pool_amount,
        work_budget,
        level: 1,
        entropy_seed: SEED,
    }
}

/// Level 1 engine with `tickets` ids in category 17, which is marked exterminated.
fn extermination_engine(prize: u64, tickets: u32) -> EngineState {
    let mut engine = EngineState::new(EngineConfig::default()).unwrap();
    engine.deposit(PoolId::CurrentPrize, prize).unwrap();
    let ids: Vec<Pubkey> = (0..tickets).map(participant).collect();
    engine.add_tickets(1, 17, &ids).unwrap();
    engine.mark_exterminated(1, 17, &participant(1_000_000)).unwrap();
    engine
}

/// Calls the run until it reports finished, returning every step.
fn drive(engine: &mut EngineState, req: &RunRequest, router: &mut dyn BondRouter) -> Vec<RunOutcome> {
    let mut steps = Vec::new();
    loop {
        let out = engine.start_or_resume_run(req, router).unwrap();
        let finished = out.finished;
        steps.push(out);
        if finished {
            return steps;
        }
        assert!(steps.len() < 100_000, "run never finished");
    }
}

fn totals_by_winner(steps: &[RunOutcome]) -> BTreeMap<Pubkey, u64> {
    let mut totals = BTreeMap::new();
    for payout in steps.iter().flat_map(|s| s.payouts.iter()) {
        *totals.entry(payout.winner).or_insert(0) += payout.total();
    }
    totals
}

fn assert_conserved(steps: &[RunOutcome], pool_amount: u64) {
    let direct: u64 = steps.iter().map(|s| s.direct_total()).sum();
    let bonded: u64 = steps.iter().map(|s| s.bond_routed).sum();
    let last = steps.last().unwrap();
    assert_eq!(
        direct + bonded + last.pool_remainder + last.reserved_for_claims,
        pool_amount
    );
}

#[test]
fn finished_runs_account_for_the_whole_pool() {
    for (prize, tickets) in [(0u64, 10u32), (1, 10), (999_999, 3), (5_000_000, 400), (77_777_777_777, 60)] {
        let mut engine = extermination_engine(prize, tickets);
        let pool = engine.ledger.current_prize;
        let steps = drive(&mut engine, &request(RunKind::Extermination, pool, 0), &mut DisabledBondRouter);
        assert_conserved(&steps, pool);

        let winners: usize = steps.iter().map(|s| s.payouts.len()).sum();
        assert!(winners <= engine.config.max_winners as usize);
        assert_eq!(engine.ledger.claimable, engine.claimables.total().unwrap());
        engine.ledger.ensure_solvent().unwrap();
    }
}

#[test]
fn same_seed_same_payouts() {
    let run = || {
        let mut engine = extermination_engine(3_000_000, 250);
        let pool = engine.ledger.current_prize;
        drive(&mut engine, &request(RunKind::Extermination, pool, 0), &mut DisabledBondRouter)
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
    assert!(!a[0].payouts.is_empty());
}

#[test]
fn budget_does_not_change_the_result() {
    let settle = |budget: u32| {
        let mut engine = extermination_engine(8_000_000, 120);
        let pool = engine.ledger.current_prize;
        let steps = drive(
            &mut engine,
            &request(RunKind::Extermination, pool, budget),
            &mut RecordingBondRouter::unlimited(),
        );
        (engine.ledger, engine.claimables.clone(), totals_by_winner(&steps), steps)
    };

    let (ledger, claimables, totals, whole) = settle(0);
    assert_eq!(whole.len(), 1);
    for budget in [1, 7] {
        let (l, c, t, steps) = settle(budget);
        assert_eq!(l, ledger);
        assert_eq!(c, claimables);
        assert_eq!(t, totals);
        assert!(steps.len() > 1);
        for pair in steps.windows(2) {
            if pair[0].phase == pair[1].phase_start {
                assert_eq!(pair[0].cursor_end, pair[1].cursor_start);
            }
        }
        assert!(steps.iter().all(|s| s.work_used <= budget));
    }
}

/// Level 1 engine with every category populated, a crowded category 130, category 17
/// exterminated and a decimator book, so each run kind has winners.
fn full_level_engine() -> EngineState {
    let mut engine = EngineState::new(EngineConfig::default()).unwrap();
    engine.deposit(PoolId::CurrentPrize, 9_000_000).unwrap();
    engine.deposit(PoolId::Reward, 6_000_000).unwrap();
    for category in 0..CATEGORY_COUNT as u32 {
        let ids: Vec<Pubkey> = (0..4).map(|i| participant(category * 4 + i)).collect();
        engine.add_tickets(1, category as u16, &ids).unwrap();
    }
    let crowd: Vec<Pubkey> = (5_000..5_400).map(participant).collect();
    engine.add_tickets(1, 130, &crowd).unwrap();
    engine.mark_exterminated(1, 17, &participant(1_000_000)).unwrap();
    for n in 0..300u32 {
        let denom = DECIMATOR_MIN_DENOM + (n as usize % DECIMATOR_DENOM_COUNT) as u8;
        engine
            .record_decimator_burn(1, &participant(20_000 + n), 1_000 + n as u64, denom)
            .unwrap();
    }
    engine
}

#[test]
fn budget_does_not_change_any_run_kind() {
    for kind in RunKind::ALL {
        let settle = |budget: u32| {
            let mut engine = full_level_engine();
            let pool = match kind.funding_pool() {
                PoolId::Reward => 4_000_000,
                _ => 5_000_000,
            };
            let steps = drive(
                &mut engine,
                &request(kind, pool, budget),
                &mut RecordingBondRouter::unlimited(),
            );
            assert_conserved(&steps, pool);
            let last = steps.last().unwrap();
            let settled = (
                engine.ledger,
                engine.claimables.clone(),
                engine.decimators.clone(),
                totals_by_winner(&steps),
                last.pool_remainder,
                last.reserved_for_claims,
            );
            (settled, steps)
        };

        let (whole, whole_steps) = settle(u32::MAX);
        assert_eq!(whole_steps.len(), 1, "{:?}", kind);
        // decimator winners are paid through claims
        assert!(!whole.3.is_empty() || whole.5 > 0, "{:?} paid nobody", kind);
        for budget in [1, 7] {
            let (split, steps) = settle(budget);
            assert_eq!(split, whole, "{:?} with budget {}", kind, budget);
            assert!(steps.len() > 1);
            for pair in steps.windows(2) {
                if pair[0].phase == pair[1].phase_start {
                    assert_eq!(pair[0].cursor_end, pair[1].cursor_start);
                }
            }
            assert!(steps.iter().all(|s| s.work_used <= budget));
        }
    }
}

#[test]
fn tier_shares_sum_for_every_rotation() {
    let cfg = EngineConfig::default();
    for n in 0..64u8 {
        let entropy = Entropy::from_bytes(&[n; 32]);
        for offset in 0..TIER_COUNT {
            let sum: u32 = rotated_shares(&cfg, offset).iter().map(|s| *s as u32).sum();
            assert_eq!(sum, 10_000);
        }
        let pool = 1_000_003 * (n as u64 + 1);
        let plan = allocate(pool, &entropy, &cfg, &[50; TIER_COUNT]).unwrap();
        assert_eq!(plan.total_share().unwrap(), pool);
    }
}

#[test]
fn refused_bonds_are_paid_directly() {
    let pool_of = |engine: &EngineState| engine.ledger.current_prize;

    let mut refused = extermination_engine(4_000_000, 80);
    let pool = pool_of(&refused);
    let refused_steps = drive(&mut refused, &request(RunKind::Extermination, pool, 0), &mut DisabledBondRouter);

    let mut routed = extermination_engine(4_000_000, 80);
    let routed_steps = drive(
        &mut routed,
        &request(RunKind::Extermination, pool, 0),
        &mut RecordingBondRouter::unlimited(),
    );

    assert!(refused_steps.iter().all(|s| s.bond_routed == 0 && s.bond_outflow == 0));
    assert!(routed_steps.iter().any(|s| s.bond_routed > 0));
    assert_eq!(totals_by_winner(&refused_steps), totals_by_winner(&routed_steps));
    assert_eq!(refused.ledger.assets_held, 4_000_000);
    refused.ledger.ensure_solvent().unwrap();
    routed.ledger.ensure_solvent().unwrap();
}

#[test]
fn three_tickets_one_holder() {
    let holder = participant(3);
    let mut engine = EngineState::new(EngineConfig::default()).unwrap();
    engine.deposit(PoolId::CurrentPrize, 2_000_000).unwrap();
    engine.add_tickets(1, 40, &[holder, holder, holder]).unwrap();
    engine.mark_exterminated(1, 40, &participant(9)).unwrap();

    let steps = drive(
        &mut engine,
        &request(RunKind::Extermination, 1_000_000, 0),
        &mut DisabledBondRouter,
    );
    let out = steps.last().unwrap();
    assert!(out.finished);
    assert!(out.payouts.iter().all(|p| p.winner == holder));

    let mut per_tier = [0u64; TIER_COUNT];
    let mut winners = [0usize; TIER_COUNT];
    for p in &out.payouts {
        per_tier[p.tier as usize] += p.total();
        winners[p.tier as usize] += 1;
    }
    assert_eq!(winners[SOLO_TIER], 1);
    assert!(winners.iter().all(|w| *w <= 3));

    let others: u64 = (0..TIER_COUNT).filter(|i| *i != SOLO_TIER).map(|i| per_tier[i]).sum();
    assert_eq!(per_tier[SOLO_TIER], 1_000_000 - others - out.pool_remainder);
    assert_eq!(engine.claimables.balance(&holder), 1_000_000 - out.pool_remainder);
    assert_eq!(engine.drain_rewards(8).len(), 1);
}

#[test]
fn empty_category_returns_the_pool() {
    let mut engine = EngineState::new(EngineConfig::default()).unwrap();
    engine.deposit(PoolId::CurrentPrize, 500_000).unwrap();
    let out = engine
        .start_or_resume_run(&request(RunKind::Daily, 500_000, 0), &mut DisabledBondRouter)
        .unwrap();
    assert!(out.finished);
    assert!(out.payouts.is_empty());
    assert_eq!(out.pool_remainder, 500_000);
    assert_eq!(engine.ledger.current_prize, 500_000);
    assert!(!engine.has_run_in_progress());
}

#[test]
fn single_step_scan_visits_each_entry_once() {
    const ENTRIES: u32 = 10_000;
    let mut engine = EngineState::new(EngineConfig::default()).unwrap();
    engine.deposit(PoolId::Reward, 1_000_000).unwrap();
    for n in 0..ENTRIES {
        let denom = DECIMATOR_MIN_DENOM + (n as usize % DECIMATOR_DENOM_COUNT) as u8;
        engine
            .record_decimator_burn(1, &participant(n), n as u64 + 1, denom)
            .unwrap();
    }

    let steps = drive(&mut engine, &request(RunKind::Decimator, 1_000_000, 1), &mut DisabledBondRouter);
    let primary: Vec<&RunOutcome> = steps
        .iter()
        .filter(|s| s.phase_start == RunPhase::ScanningPrimary)
        .collect();
    assert_eq!(primary.len(), ENTRIES as usize);
    for (i, step) in primary.iter().enumerate() {
        assert_eq!(step.cursor_start, i as u32);
        assert_eq!(step.work_used, 1);
    }
    assert_conserved(&steps, 1_000_000);
}

#[test]
fn claims_are_paid_once() {
    let mut engine = EngineState::new(EngineConfig::default()).unwrap();
    engine.deposit(PoolId::Reward, 60_000).unwrap();
    for n in 0..80 {
        engine.record_decimator_burn(1, &participant(n), 500, 4).unwrap();
    }
    drive(&mut engine, &request(RunKind::Decimator, 60_000, 0), &mut DisabledBondRouter);

    let book = &engine.decimators[&1];
    let round = *book.claim_round();
    let (winners, losers): (Vec<Pubkey>, Vec<Pubkey>) = {
        let (w, l): (Vec<&DecimatorEntry>, Vec<&DecimatorEntry>) = book.entries().iter().partition(|e| round.is_winner(e));
        (
            w.iter().map(|e| e.participant).collect(),
            l.iter().map(|e| e.participant).collect(),
        )
    };
    assert!(winners.len() >= 2);
    let winner = winners[0];

    let paid = engine.claim(1, &winner).unwrap();
    assert_eq!(engine.claim(1, &winner).unwrap_err(), ErrorCode::AlreadyClaimed.into());
    assert_eq!(engine.claimables.balance(&winner), paid);
    if let Some(loser) = losers.first() {
        assert_eq!(
            engine.claim(1, loser).unwrap_err(),
            ErrorCode::NotAWinner.into()
        );
    }

    engine.prune_claim_round(1).unwrap();
    assert_eq!(
        engine.claim(1, &winners[1]).unwrap_err(),
        ErrorCode::ClaimRoundInactive.into()
    );
    assert_eq!(engine.ledger.claimable, paid);
    engine.ledger.ensure_solvent().unwrap();
}
