use anchor_lang::prelude::*;

pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod state;
pub mod table;
pub mod utils;
pub mod instructions;

use instructions::*;

#[cfg(feature = "devnet")]
declare_id!("AeirZgytU8rtTrLoKmyzmgtZTu9e5Pc49x4VyqSeZkGC");

#[cfg(not(feature = "devnet"))]
declare_id!("GJtKRRMpc3pz1Zkorz5A84vaLu6TTHNLob2CLXmWNjqN");

#[program]
pub mod jackpot_settlement {
    use super::*;

    pub fn init_engine(ctx: Context<InitEngine>, args: InitEngineArgs) -> Result<()> {
        init_engine::handler(ctx, args)
    }

    pub fn update_engine_config(
        ctx: Context<UpdateEngineConfig>,
        args: UpdateEngineConfigArgs,
    ) -> Result<()> {
        update_engine_config::handler(ctx, args)
    }

    pub fn transfer_admin(ctx: Context<TransferAdmin>, new_admin: Pubkey) -> Result<()> {
        transfer_admin::handler(ctx, new_admin)
    }

    /// Deposit tokens into a prize pool. The claimable pool only grows from payouts.
    pub fn fund_pool(ctx: Context<FundPool>, pool: u8, amount: u64) -> Result<()> {
        fund_pool::handler(ctx, pool, amount)
    }

    pub fn advance_level(ctx: Context<AdvanceLevel>, new_level: u32) -> Result<()> {
        advance_level::handler(ctx, new_level)
    }

    pub fn init_ticket_pool(ctx: Context<InitTicketPool>, level: u32, category: u16) -> Result<()> {
        init_ticket_pool::handler(ctx, level, category)
    }

    pub fn add_tickets(
        ctx: Context<AddTickets>,
        level: u32,
        category: u16,
        ids: Vec<Pubkey>,
    ) -> Result<()> {
        add_tickets::handler(ctx, level, category, ids)
    }

    /// Close a past level's ticket pool. Returns rent to recipient.
    pub fn close_ticket_pool(ctx: Context<CloseTicketPool>, level: u32, category: u16) -> Result<()> {
        close_ticket_pool::handler(ctx, level, category)
    }

    /// Mark the current level's exterminated category and pay the exterminator split.
    pub fn mark_exterminated(
        ctx: Context<MarkExterminated>,
        category: u16,
        exterminator: Pubkey,
    ) -> Result<()> {
        mark_exterminated::handler(ctx, category, exterminator)
    }

    pub fn init_decimator_book(ctx: Context<InitDecimatorBook>, level: u32) -> Result<()> {
        init_decimator_book::handler(ctx, level)
    }

    pub fn record_decimator_burn(
        ctx: Context<RecordDecimatorBurn>,
        level: u32,
        participant: Pubkey,
        weight: u64,
        denom: u8,
    ) -> Result<()> {
        record_decimator_burn::handler(ctx, level, participant, weight, denom)
    }

    pub fn request_entropy(ctx: Context<RequestEntropy>) -> Result<()> {
        request_entropy::handler(ctx)
    }

    pub fn entropy_callback(ctx: Context<EntropyCallback>, randomness: [u8; 32]) -> Result<()> {
        entropy_callback::handler(ctx, randomness)
    }

    /// Admin-only entropy fulfillment (bypasses VRF oracle). Only available with `devnet` feature.
    #[cfg(feature = "devnet")]
    pub fn mock_fulfill_entropy(
        ctx: Context<MockFulfillEntropy>,
        randomness: [u8; 32],
    ) -> Result<()> {
        mock_fulfill_entropy::handler(ctx, randomness)
    }

    /// Start a run of `kind`, or continue the one in progress, within `work_budget` units.
    /// Ticket pools for the categories the run reads are passed as remaining accounts.
    pub fn start_or_resume_run<'info>(
        ctx: Context<'_, '_, 'info, 'info, StartOrResumeRun<'info>>,
        kind: u8,
        pool_amount: u64,
        work_budget: u32,
    ) -> Result<()> {
        start_or_resume_run::handler(ctx, kind, pool_amount, work_budget)
    }

    pub fn claim_decimator(ctx: Context<ClaimDecimator>, level: u32) -> Result<()> {
        claim_decimator::handler(ctx, level)
    }

    pub fn withdraw(ctx: Context<Withdraw>) -> Result<()> {
        withdraw::handler(ctx)
    }

    /// Emit up to `max` queued deferred rewards and drop them from the queue.
    pub fn drain_rewards(ctx: Context<DrainRewards>, max: u8) -> Result<()> {
        drain_rewards::handler(ctx, max)
    }

    /// Admin abort of a stuck run. Undistributed funds return to the funding pool.
    pub fn admin_abort_run(ctx: Context<AdminAbortRun>, kind: u8) -> Result<()> {
        admin_abort_run::handler(ctx, kind)
    }

    /// Close a level's claim round. Unclaimed shares move to the reward pool.
    pub fn prune_claim_round(ctx: Context<PruneClaimRound>, level: u32) -> Result<()> {
        prune_claim_round::handler(ctx, level)
    }
}
