use anchor_lang::prelude::*;

use crate::{constants::*, errors::ErrorCode, events::AdminTransferred, state::Engine};

#[derive(Accounts)]
pub struct TransferAdmin<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_admin(&admin.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,
}

pub fn handler(ctx: Context<TransferAdmin>, new_admin: Pubkey) -> Result<()> {
    let old_admin = ctx.accounts.engine.transfer_admin(new_admin)?;
    emit!(AdminTransferred {
        old_admin,
        new_admin,
    });
    Ok(())
}
