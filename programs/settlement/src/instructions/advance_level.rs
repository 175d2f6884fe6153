use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::LevelAdvanced,
    state::{CategoryBoard, Engine},
};

#[derive(Accounts)]
pub struct AdvanceLevel<'info> {
    pub operator: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&operator.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    #[account(mut, seeds = [SEED_BOARD], bump)]
    pub board: AccountLoader<'info, CategoryBoard>,
}

/// Rolls the prize pools into `new_level` and resets the daily counters.
pub fn handler(ctx: Context<AdvanceLevel>, new_level: u32) -> Result<()> {
    let engine = &mut ctx.accounts.engine;
    require!(new_level > engine.level, ErrorCode::LevelMismatch);
    require!(engine.active_runs == 0, ErrorCode::RunsInProgress);

    let mut ledger = engine.ledger;
    let rotation = ledger.rotate_level(new_level)?;
    ledger.ensure_solvent()?;
    engine.ledger = ledger;
    engine.level = new_level;

    let mut board = ctx.accounts.board.load_mut()?;
    board.reset_for_level(new_level);

    emit!(LevelAdvanced {
        level: new_level,
        carried_to_reward: rotation.carried_to_reward,
        prize_base: rotation.prize_base,
    });

    Ok(())
}
