use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::TicketsAdded,
    state::{CategoryBoard, Engine, TicketPoolAccount},
    table::{append_records, table_len},
    utils::ensure_account_len,
};

#[derive(Accounts)]
#[instruction(level: u32, category: u16)]
pub struct AddTickets<'info> {
    #[account(mut)]
    pub operator: Signer<'info>,

    #[account(
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&operator.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    #[account(mut, seeds = [SEED_BOARD], bump)]
    pub board: AccountLoader<'info, CategoryBoard>,

    #[account(
        mut,
        seeds = [SEED_TICKETS, &level.to_le_bytes(), &category.to_le_bytes()],
        bump = ticket_pool.bump,
    )]
    pub ticket_pool: Account<'info, TicketPoolAccount>,

    pub system_program: Program<'info, System>,
}

/// Appends participant ids to a (level, category) pool. Duplicates are allowed.
pub fn handler(ctx: Context<AddTickets>, level: u32, category: u16, ids: Vec<Pubkey>) -> Result<()> {
    require!(ids.len() <= MAX_TICKETS_PER_INSERT, ErrorCode::TooManyTickets);
    require!(level >= ctx.accounts.engine.level, ErrorCode::LevelMismatch);

    let len = ctx.accounts.ticket_pool.len;
    let added = ids.len() as u32;
    let info = ctx.accounts.ticket_pool.to_account_info();
    ensure_account_len(
        &info,
        &ctx.accounts.operator.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        table_len::<Pubkey>(TicketPoolAccount::HEADER_SPACE, len.saturating_add(added)),
    )?;

    let new_len = {
        let mut data = info.try_borrow_mut_data()?;
        append_records(&mut data[..], TicketPoolAccount::HEADER_SPACE, len, &ids)?
    };
    ctx.accounts.ticket_pool.len = new_len;

    let mut board = ctx.accounts.board.load_mut()?;
    let counter = &mut board.daily_counts.data[category as usize];
    *counter = counter.saturating_add(added);

    emit!(TicketsAdded {
        level,
        category,
        added,
        pool_len: new_len,
    });

    Ok(())
}
