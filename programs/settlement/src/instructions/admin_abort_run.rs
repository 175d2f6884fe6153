use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::decimator::DecimatorRecords,
    engine::scan::{abort, RunKind},
    errors::ErrorCode,
    events::RunAborted,
    state::{DecimatorBookAccount, Engine, RunAccount},
    table::DecimatorTable,
};

#[derive(Accounts)]
#[instruction(kind: u8)]
pub struct AdminAbortRun<'info> {
    #[account(
        constraint = engine.is_admin(&admin.key()) @ ErrorCode::Unauthorized
    )]
    pub admin: Signer<'info>,

    #[account(mut, seeds = [SEED_ENGINE], bump = engine.bump)]
    pub engine: Box<Account<'info, Engine>>,

    #[account(
        mut,
        seeds = [SEED_RUN, &kind.to_le_bytes()],
        bump = run.bump,
    )]
    pub run: Box<Account<'info, RunAccount>>,

    /// Required when aborting a decimator run, to unfreeze it.
    #[account(mut)]
    pub decimator_book: Option<Account<'info, DecimatorBookAccount>>,
}

/// Retires a stuck run and refunds its undistributed pool to the funding pool.
pub fn handler(ctx: Context<AdminAbortRun>, kind: u8) -> Result<()> {
    let run_kind = RunKind::try_from(kind)?;
    let accounts = ctx.accounts;

    let mut run = accounts.run.run.clone();
    let level = run.level;
    if let Some(book) = accounts.decimator_book.as_ref() {
        require!(book.level == level, ErrorCode::LevelMismatch);
    }

    let mut ledger = accounts.engine.ledger;
    let mut book = accounts.decimator_book.as_mut().map(DecimatorTable::new);
    let refund = abort(
        &mut run,
        book.as_mut().map(|b| b as &mut dyn DecimatorRecords),
        &mut ledger,
    )?;
    ledger.ensure_solvent()?;

    accounts.engine.ledger = ledger;
    accounts.engine.active_runs &= !run_kind.bit();
    accounts.run.run = run;

    emit!(RunAborted {
        kind,
        level,
        admin: accounts.admin.key(),
        refund,
    });

    Ok(())
}
