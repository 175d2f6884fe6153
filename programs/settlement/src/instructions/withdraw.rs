use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{
    constants::*,
    engine::ledger::{ClaimableLedger, PoolId},
    errors::ErrorCode,
    events::Withdrawn,
    state::{ClaimableBookAccount, Engine},
    table::ClaimableTable,
};

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(mut, seeds = [SEED_ENGINE], bump = engine.bump)]
    pub engine: Box<Account<'info, Engine>>,

    #[account(mut, seeds = [SEED_CLAIMABLE], bump = claimable_book.bump)]
    pub claimable_book: Account<'info, ClaimableBookAccount>,

    #[account(
        mut,
        constraint = owner_token_account.mint == engine.mint @ ErrorCode::InvalidTokenAccount,
        constraint = owner_token_account.owner == owner.key() @ ErrorCode::InvalidTokenAccount,
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    #[account(mut, address = engine.vault @ ErrorCode::InvalidVault)]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Pays out the owner's whole claimable balance.
pub fn handler(ctx: Context<Withdraw>) -> Result<()> {
    let owner = ctx.accounts.owner.key();
    let amount = ClaimableTable::new(&mut ctx.accounts.claimable_book).take(&owner)?;

    let mut ledger = ctx.accounts.engine.ledger;
    ledger.release(PoolId::Claimable, amount)?;
    ledger.ensure_solvent()?;
    ctx.accounts.engine.ledger = ledger;

    let bump = ctx.accounts.engine.bump;
    let signer_seeds: &[&[u8]] = &[SEED_ENGINE, &[bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.vault.to_account_info(),
                to: ctx.accounts.owner_token_account.to_account_info(),
                authority: ctx.accounts.engine.to_account_info(),
            },
            &[signer_seeds],
        ),
        amount,
    )?;

    emit!(Withdrawn { owner, amount });

    Ok(())
}
