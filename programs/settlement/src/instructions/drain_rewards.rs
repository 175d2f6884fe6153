use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::RewardDequeued,
    state::{Engine, RewardQueueAccount},
};

#[derive(Accounts)]
pub struct DrainRewards<'info> {
    pub operator: Signer<'info>,

    #[account(
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&operator.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    #[account(mut, seeds = [SEED_REWARDS], bump = reward_queue.bump)]
    pub reward_queue: Box<Account<'info, RewardQueueAccount>>,
}

/// Hands up to `max` deferred rewards to the off-chain processor through events.
pub fn handler(ctx: Context<DrainRewards>, max: u8) -> Result<()> {
    let drained = ctx.accounts.reward_queue.queue.drain(max as usize);
    for reward in drained {
        emit!(RewardDequeued {
            beneficiary: reward.beneficiary,
            category: reward.category,
            level: reward.level,
        });
    }
    Ok(())
}
