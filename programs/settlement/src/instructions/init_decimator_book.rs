use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::decimator::ClaimRound,
    state::DecimatorBookAccount,
};

#[derive(Accounts)]
#[instruction(level: u32)]
pub struct InitDecimatorBook<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        init,
        payer = payer,
        space = DecimatorBookAccount::HEADER_SPACE,
        seeds = [SEED_DECIMATOR, &level.to_le_bytes()],
        bump
    )]
    pub decimator_book: Account<'info, DecimatorBookAccount>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitDecimatorBook>, level: u32) -> Result<()> {
    let book = &mut ctx.accounts.decimator_book;
    book.level = level;
    book.bump = ctx.bumps.decimator_book;
    book.frozen = false;
    book.len = 0;
    book.round = ClaimRound::default();
    Ok(())
}
