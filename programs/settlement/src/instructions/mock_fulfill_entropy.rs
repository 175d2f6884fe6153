use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    instructions::entropy_callback::fulfill,
    state::{Engine, EntropyStatus},
};

#[derive(Accounts)]
pub struct MockFulfillEntropy<'info> {
    /// Admin-only: test fulfillment without the VRF oracle.
    #[account(constraint = engine.is_admin(&admin.key()) @ ErrorCode::Unauthorized)]
    pub admin: Signer<'info>,

    #[account(mut, seeds = [SEED_ENGINE], bump = engine.bump)]
    pub engine: Box<Account<'info, Engine>>,
}

pub fn handler(ctx: Context<MockFulfillEntropy>, randomness: [u8; 32]) -> Result<()> {
    let engine = &mut ctx.accounts.engine;
    require!(engine.active_runs == 0, ErrorCode::RunsInProgress);
    if engine.entropy_status != EntropyStatus::Requested as u8 {
        engine.entropy_requests = engine
            .entropy_requests
            .checked_add(1)
            .ok_or(ErrorCode::MathOverflow)?;
        engine.entropy_status = EntropyStatus::Requested as u8;
    }
    fulfill(engine, randomness)
}
