use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::tickets::validate_category,
    state::TicketPoolAccount,
};

#[derive(Accounts)]
#[instruction(level: u32, category: u16)]
pub struct InitTicketPool<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        init,
        payer = payer,
        space = TicketPoolAccount::HEADER_SPACE,
        seeds = [SEED_TICKETS, &level.to_le_bytes(), &category.to_le_bytes()],
        bump
    )]
    pub ticket_pool: Account<'info, TicketPoolAccount>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitTicketPool>, level: u32, category: u16) -> Result<()> {
    validate_category(category)?;
    let pool = &mut ctx.accounts.ticket_pool;
    pool.level = level;
    pool.category = category;
    pool.bump = ctx.bumps.ticket_pool;
    pool.len = 0;
    Ok(())
}
