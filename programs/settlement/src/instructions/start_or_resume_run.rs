use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{
    constants::*,
    engine::bond::VaultBondRouter,
    engine::decimator::DecimatorRecords,
    engine::resolver::SettlementContext,
    engine::scan::{base_entropy, start_or_resume, JackpotRun, Population, RunKind, RunRequest},
    engine::tickets::winning_categories,
    errors::ErrorCode,
    events::{RunFinished, RunProgressed},
    state::{
        CategoryBoard, ClaimableBookAccount, DecimatorBookAccount, Engine, EntropyStatus,
        RewardQueueAccount, RunAccount,
    },
    table::{ClaimableTable, DecimatorTable, LevelPools},
};

#[derive(Accounts)]
#[instruction(kind: u8)]
pub struct StartOrResumeRun<'info> {
    #[account(mut)]
    pub operator: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&operator.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    #[account(seeds = [SEED_BOARD], bump)]
    pub board: AccountLoader<'info, CategoryBoard>,

    #[account(
        init_if_needed,
        payer = operator,
        space = RunAccount::SPACE,
        seeds = [SEED_RUN, &kind.to_le_bytes()],
        bump
    )]
    pub run: Box<Account<'info, RunAccount>>,

    #[account(mut, seeds = [SEED_CLAIMABLE], bump = claimable_book.bump)]
    pub claimable_book: Box<Account<'info, ClaimableBookAccount>>,

    #[account(mut, seeds = [SEED_REWARDS], bump = reward_queue.bump)]
    pub reward_queue: Box<Account<'info, RewardQueueAccount>>,

    /// Required for decimator runs only.
    #[account(mut)]
    pub decimator_book: Option<Box<Account<'info, DecimatorBookAccount>>>,

    #[account(mut, address = engine.vault @ ErrorCode::InvalidVault)]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut, address = engine.bond_vault @ ErrorCode::InvalidVault)]
    pub bond_vault: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Ticket pools a call reads. The caller passes these PDAs (initialized or not) in
/// `remaining_accounts`.
fn ticket_categories(
    run: &JackpotRun,
    kind: RunKind,
    board: &CategoryBoard,
    req: &RunRequest,
) -> Vec<u16> {
    if run.in_progress {
        return match kind {
            RunKind::Daily | RunKind::Extermination => run
                .tiers
                .iter()
                .filter(|t| t.winner_count > 0)
                .map(|t| t.category)
                .collect(),
            RunKind::Scatter => vec![run.scatter_category],
            RunKind::Decimator => Vec::new(),
        };
    }
    let base = base_entropy(&req.entropy_seed, kind, req.level);
    match kind {
        RunKind::Daily => winning_categories(&board.daily_counts.data, &base).to_vec(),
        RunKind::Extermination => board.exterminated().into_iter().collect(),
        RunKind::Scatter => vec![winning_categories(&board.daily_counts.data, &base)[2]],
        RunKind::Decimator => Vec::new(),
    }
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, StartOrResumeRun<'info>>,
    kind: u8,
    pool_amount: u64,
    work_budget: u32,
) -> Result<()> {
    let run_kind = RunKind::try_from(kind)?;
    let remaining = ctx.remaining_accounts;
    let run_bump = ctx.bumps.run;
    let accounts = ctx.accounts;

    let config = accounts.engine.config;
    let budget = config
        .effective_budget(work_budget)
        .min(MAX_ONCHAIN_WORK_BUDGET);
    let req = RunRequest {
        kind,
        pool_amount,
        work_budget: budget,
        level: accounts.engine.level,
        entropy_seed: accounts.engine.entropy,
    };

    let mut run = accounts.run.run.clone();
    if !run.in_progress {
        require!(
            accounts.engine.entropy_status == EntropyStatus::Ready as u8,
            ErrorCode::EntropyNotReady
        );
    }
    if let Some(book) = accounts.decimator_book.as_ref() {
        require!(book.level == req.level, ErrorCode::LevelMismatch);
    }

    let board = accounts.board.load()?;
    require!(board.level == req.level, ErrorCode::LevelMismatch);
    let categories = ticket_categories(&run, run_kind, &board, &req);
    let pools = LevelPools::load(req.level, &categories, remaining)?;

    let payer = accounts.operator.to_account_info();
    let system_program = accounts.system_program.to_account_info();
    let mut claimables = ClaimableTable::new(&mut accounts.claimable_book);
    if run_kind != RunKind::Decimator {
        // each unit of work credits at most one new owner
        claimables.reserve(&payer, &system_program, budget)?;
    }
    let mut decimator = accounts.decimator_book.as_mut().map(|b| DecimatorTable::new(b));
    let mut ledger = accounts.engine.ledger;
    let mut router = VaultBondRouter::new(config.bond_routing_enabled, config.bond_min_route);

    let out = {
        let mut pop = Population {
            tickets: &pools,
            daily_counts: &board.daily_counts.data,
            exterminated: board.exterminated(),
            decimator: decimator.as_mut().map(|d| d as &mut dyn DecimatorRecords),
        };
        let mut settlement = SettlementContext {
            config: &config,
            ledger: &mut ledger,
            claimables: &mut claimables,
            rewards: &mut accounts.reward_queue.queue,
            router: &mut router,
            bond_outflow: 0,
        };
        start_or_resume(&mut run, &req, &mut pop, &mut settlement)?
    };
    ledger.ensure_solvent()?;
    drop(board);

    if out.bond_outflow > 0 {
        let bump = accounts.engine.bump;
        let signer_seeds: &[&[u8]] = &[SEED_ENGINE, &[bump]];
        token::transfer(
            CpiContext::new_with_signer(
                accounts.token_program.to_account_info(),
                Transfer {
                    from: accounts.vault.to_account_info(),
                    to: accounts.bond_vault.to_account_info(),
                    authority: accounts.engine.to_account_info(),
                },
                &[signer_seeds],
            ),
            out.bond_outflow,
        )?;
    }

    let engine = &mut accounts.engine;
    engine.ledger = ledger;
    if out.finished {
        engine.active_runs &= !run_kind.bit();
    } else {
        engine.active_runs |= run_kind.bit();
    }

    let slot = &mut accounts.run;
    slot.kind = kind;
    slot.bump = run_bump;
    slot.run = run;

    emit!(RunProgressed {
        kind,
        level: out.level,
        phase: out.phase as u8,
        cursor_start: out.cursor_start,
        cursor_end: out.cursor_end,
        work_used: out.work_used,
        winners: out.payouts.len() as u32,
        direct_paid: out.direct_total(),
        bond_routed: out.bond_routed,
        bond_outflow: out.bond_outflow,
    });
    if out.finished {
        emit!(RunFinished {
            kind,
            level: out.level,
            pool_remainder: out.pool_remainder,
            reserved_for_claims: out.reserved_for_claims,
        });
    }

    Ok(())
}
