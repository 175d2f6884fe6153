use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{
    constants::*,
    engine::ledger::PoolId,
    errors::ErrorCode,
    events::PoolFunded,
    state::Engine,
};

#[derive(Accounts)]
pub struct FundPool<'info> {
    #[account(mut)]
    pub funder: Signer<'info>,

    #[account(mut, seeds = [SEED_ENGINE], bump = engine.bump)]
    pub engine: Box<Account<'info, Engine>>,

    #[account(
        mut,
        constraint = funder_token_account.mint == engine.mint @ ErrorCode::InvalidTokenAccount,
        constraint = funder_token_account.owner == funder.key() @ ErrorCode::InvalidTokenAccount,
    )]
    pub funder_token_account: Account<'info, TokenAccount>,

    #[account(mut, address = engine.vault @ ErrorCode::InvalidVault)]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Moves `amount` from the funder into custody and books it to `pool`.
pub fn handler(ctx: Context<FundPool>, pool: u8, amount: u64) -> Result<()> {
    let pool_id = PoolId::try_from(pool)?;
    require!(pool_id != PoolId::Claimable, ErrorCode::InvalidPool);
    require!(amount > 0, ErrorCode::InvalidPool);

    let mut ledger = ctx.accounts.engine.ledger;
    ledger.deposit(pool_id, amount)?;
    ledger.ensure_solvent()?;
    ctx.accounts.engine.ledger = ledger;

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.funder_token_account.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
                authority: ctx.accounts.funder.to_account_info(),
            },
        ),
        amount,
    )?;

    emit!(PoolFunded {
        funder: ctx.accounts.funder.key(),
        pool,
        amount,
        assets_held_after: ledger.assets_held,
    });

    Ok(())
}
