use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::EngineConfigUpdated,
    state::Engine,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default)]
pub struct UpdateEngineConfigArgs {
    pub operator: Option<Pubkey>,
    pub bond_vault: Option<Pubkey>,
    pub tier_shares_bps: Option<[u16; TIER_COUNT]>,
    pub base_winner_counts: Option<[u16; TIER_COUNT]>,
    pub scale_floor: Option<u64>,
    pub scale_ceiling: Option<u64>,
    pub max_scale_bps: Option<u32>,
    pub max_winners: Option<u16>,
    pub payout_unit: Option<u64>,
    pub solo_bond_bps: Option<u16>,
    pub bond_winner_count: Option<u16>,
    pub bond_mirror_bps: Option<u16>,
    pub bond_reward_return_bps: Option<u16>,
    pub bond_routing_enabled: Option<bool>,
    pub bond_min_route: Option<u64>,
    pub scatter_odds: Option<u32>,
    pub default_work_budget: Option<u32>,
}

#[derive(Accounts)]
pub struct UpdateEngineConfig<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_admin(&admin.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,
}

pub fn handler(ctx: Context<UpdateEngineConfig>, args: UpdateEngineConfigArgs) -> Result<()> {
    let engine = &mut ctx.accounts.engine;
    // Distribution parameters are read by in-flight runs on every call.
    require!(engine.active_runs == 0, ErrorCode::RunsInProgress);

    if let Some(v) = args.operator {
        require!(v != Pubkey::default(), ErrorCode::InvalidAdmin);
        engine.operator = v;
    }
    if let Some(v) = args.bond_vault {
        engine.bond_vault = v;
    }

    let mut cfg = engine.config;
    if let Some(v) = args.tier_shares_bps {
        cfg.tier_shares_bps = v;
    }
    if let Some(v) = args.base_winner_counts {
        cfg.base_winner_counts = v;
    }
    if let Some(v) = args.scale_floor {
        cfg.scale_floor = v;
    }
    if let Some(v) = args.scale_ceiling {
        cfg.scale_ceiling = v;
    }
    if let Some(v) = args.max_scale_bps {
        cfg.max_scale_bps = v;
    }
    if let Some(v) = args.max_winners {
        cfg.max_winners = v;
    }
    if let Some(v) = args.payout_unit {
        cfg.payout_unit = v;
    }
    if let Some(v) = args.solo_bond_bps {
        cfg.solo_bond_bps = v;
    }
    if let Some(v) = args.bond_winner_count {
        cfg.bond_winner_count = v;
    }
    if let Some(v) = args.bond_mirror_bps {
        cfg.bond_mirror_bps = v;
    }
    if let Some(v) = args.bond_reward_return_bps {
        cfg.bond_reward_return_bps = v;
    }
    if let Some(v) = args.bond_routing_enabled {
        cfg.bond_routing_enabled = v;
    }
    if let Some(v) = args.bond_min_route {
        cfg.bond_min_route = v;
    }
    if let Some(v) = args.scatter_odds {
        cfg.scatter_odds = v;
    }
    if let Some(v) = args.default_work_budget {
        cfg.default_work_budget = v;
    }
    cfg.validate()?;
    engine.config = cfg;

    emit!(EngineConfigUpdated {
        admin: ctx.accounts.admin.key(),
    });

    Ok(())
}
