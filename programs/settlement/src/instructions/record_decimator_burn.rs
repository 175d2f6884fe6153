use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::decimator::record_burn,
    errors::ErrorCode,
    events::DecimatorBurnRecorded,
    state::{DecimatorBookAccount, Engine},
    table::DecimatorTable,
};

#[derive(Accounts)]
#[instruction(level: u32)]
pub struct RecordDecimatorBurn<'info> {
    #[account(mut)]
    pub operator: Signer<'info>,

    #[account(
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

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<RecordDecimatorBurn>,
    level: u32,
    participant: Pubkey,
    weight: u64,
    denom: u8,
) -> Result<()> {
    let payer = ctx.accounts.operator.to_account_info();
    let system_program = ctx.accounts.system_program.to_account_info();
    let mut book = DecimatorTable::new(&mut ctx.accounts.decimator_book);
    book.reserve(&payer, &system_program, 1)?;
    let entry = record_burn(&mut book, &participant, weight, denom)?;

    emit!(DecimatorBurnRecorded {
        level,
        participant,
        weight_total: entry.weight,
        denom: entry.denom,
        sub: entry.sub,
    });

    Ok(())
}
