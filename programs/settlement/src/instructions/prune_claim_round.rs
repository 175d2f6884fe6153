use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::decimator::close_round,
    engine::ledger::PoolId,
    errors::ErrorCode,
    events::ClaimRoundPruned,
    state::{DecimatorBookAccount, Engine},
    table::DecimatorTable,
};

#[derive(Accounts)]
#[instruction(level: u32)]
pub struct PruneClaimRound<'info> {
    pub operator: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&operator.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    #[account(
        mut,
        seeds = [SEED_DECIMATOR, &level.to_le_bytes()],
        bump = decimator_book.bump,
    )]
    pub decimator_book: Account<'info, DecimatorBookAccount>,
}

/// Closes a claim round and returns what nobody claimed to the reward pool.
pub fn handler(ctx: Context<PruneClaimRound>, level: u32) -> Result<()> {
    let unclaimed = close_round(&mut DecimatorTable::new(&mut ctx.accounts.decimator_book))?;

    let mut ledger = ctx.accounts.engine.ledger;
    ledger.transfer(PoolId::Claimable, PoolId::Reward, unclaimed)?;
    ledger.ensure_solvent()?;
    ctx.accounts.engine.ledger = ledger;

    emit!(ClaimRoundPruned { level, unclaimed });

    Ok(())
}
