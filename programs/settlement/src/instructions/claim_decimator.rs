use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::decimator::claim,
    engine::ledger::ClaimableLedger,
    events::DecimatorClaimed,
    state::{ClaimableBookAccount, DecimatorBookAccount},
    table::{ClaimableTable, DecimatorTable},
};

#[derive(Accounts)]
#[instruction(level: u32)]
pub struct ClaimDecimator<'info> {
    #[account(mut)]
    pub claimant: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_DECIMATOR, &level.to_le_bytes()],
        bump = decimator_book.bump,
    )]
    pub decimator_book: Account<'info, DecimatorBookAccount>,

    #[account(mut, seeds = [SEED_CLAIMABLE], bump = claimable_book.bump)]
    pub claimable_book: Account<'info, ClaimableBookAccount>,

    pub system_program: Program<'info, System>,
}

/// Moves the claimant's share of the level's claim round into their claimable balance.
/// The share is already held in the Claimable pool.
pub fn handler(ctx: Context<ClaimDecimator>, level: u32) -> Result<()> {
    let claimant = ctx.accounts.claimant.key();
    let payer = ctx.accounts.claimant.to_account_info();
    let system_program = ctx.accounts.system_program.to_account_info();

    let amount = claim(&mut DecimatorTable::new(&mut ctx.accounts.decimator_book), &claimant)?;

    let mut claimables = ClaimableTable::new(&mut ctx.accounts.claimable_book);
    claimables.reserve(&payer, &system_program, 1)?;
    claimables.credit(&claimant, amount)?;

    emit!(DecimatorClaimed {
        level,
        claimant,
        amount,
    });

    Ok(())
}
