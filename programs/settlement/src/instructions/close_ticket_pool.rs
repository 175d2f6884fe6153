use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::TicketPoolClosed,
    state::{Engine, TicketPoolAccount},
};

#[derive(Accounts)]
#[instruction(level: u32, category: u16)]
pub struct CloseTicketPool<'info> {
    pub operator: Signer<'info>,

    #[account(
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&operator.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    /// CHECK: receives the rent lamports.
    #[account(mut)]
    pub recipient: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [SEED_TICKETS, &level.to_le_bytes(), &category.to_le_bytes()],
        bump = ticket_pool.bump,
        close = recipient,
    )]
    pub ticket_pool: Account<'info, TicketPoolAccount>,
}

/// Closes a finished level's pool. Runs never outlive their level, so nothing can still
/// be reading it.
pub fn handler(ctx: Context<CloseTicketPool>, level: u32, category: u16) -> Result<()> {
    require!(level < ctx.accounts.engine.level, ErrorCode::LevelStillActive);

    // Anchor's `close = recipient` handles the actual account closing + rent transfer

    emit!(TicketPoolClosed { level, category });
    Ok(())
}
