use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::ledger::{exterminator_bps, ClaimableLedger, PoolId},
    engine::tickets::validate_category,
    errors::ErrorCode,
    events::CategoryExterminated,
    state::{CategoryBoard, ClaimableBookAccount, Engine},
    table::ClaimableTable,
    utils::mul_bps,
};

#[derive(Accounts)]
pub struct MarkExterminated<'info> {
    #[account(mut)]
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

    #[account(mut, seeds = [SEED_CLAIMABLE], bump = claimable_book.bump)]
    pub claimable_book: Account<'info, ClaimableBookAccount>,

    pub system_program: Program<'info, System>,
}

/// Records the level's exterminated category and credits the exterminator's cut of the
/// current prize pool.
pub fn handler(ctx: Context<MarkExterminated>, category: u16, exterminator: Pubkey) -> Result<()> {
    validate_category(category)?;
    let level = ctx.accounts.engine.level;

    {
        let mut board = ctx.accounts.board.load_mut()?;
        require!(board.level == level, ErrorCode::LevelMismatch);
        require!(board.has_exterminated == 0, ErrorCode::AlreadyExterminated);
        board.exterminated = category;
        board.has_exterminated = 1;
    }

    let mut ledger = ctx.accounts.engine.ledger;
    let payout = mul_bps(ledger.current_prize, exterminator_bps(level) as u64)?;
    ledger.transfer(PoolId::CurrentPrize, PoolId::Claimable, payout)?;
    ledger.ensure_solvent()?;

    let payer = ctx.accounts.operator.to_account_info();
    let system_program = ctx.accounts.system_program.to_account_info();
    let mut claimables = ClaimableTable::new(&mut ctx.accounts.claimable_book);
    claimables.reserve(&payer, &system_program, 1)?;
    claimables.credit(&exterminator, payout)?;

    ctx.accounts.engine.ledger = ledger;

    emit!(CategoryExterminated {
        level,
        category,
        exterminator,
        payout,
    });

    Ok(())
}
