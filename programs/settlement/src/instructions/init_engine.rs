use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    constants::*,
    engine::config::EngineConfig,
    engine::ledger::PoolLedger,
    engine::rewards::RewardQueue,
    errors::ErrorCode,
    events::EngineInitialized,
    state::{CategoryBoard, ClaimableBookAccount, Engine, EntropyStatus, RewardQueueAccount},
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitEngineArgs {
    pub operator: Pubkey,
    /// `None` starts from the built-in defaults.
    pub config: Option<EngineConfig>,
}

#[derive(Accounts)]
pub struct InitEngine<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    pub admin: Signer<'info>,

    #[account(
        init,
        payer = payer,
        space = Engine::SPACE,
        seeds = [SEED_ENGINE],
        bump
    )]
    pub engine: Box<Account<'info, Engine>>,

    #[account(
        init,
        payer = payer,
        space = CategoryBoard::SPACE,
        seeds = [SEED_BOARD],
        bump
    )]
    pub board: AccountLoader<'info, CategoryBoard>,

    #[account(
        init,
        payer = payer,
        space = ClaimableBookAccount::HEADER_SPACE,
        seeds = [SEED_CLAIMABLE],
        bump
    )]
    pub claimable_book: Box<Account<'info, ClaimableBookAccount>>,

    #[account(
        init,
        payer = payer,
        space = RewardQueueAccount::SPACE,
        seeds = [SEED_REWARDS],
        bump
    )]
    pub reward_queue: Box<Account<'info, RewardQueueAccount>>,

    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = payer,
        associated_token::mint = mint,
        associated_token::authority = engine,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(
        constraint = bond_vault.mint == mint.key() @ ErrorCode::InvalidTokenAccount,
    )]
    pub bond_vault: Box<Account<'info, TokenAccount>>,

    pub associated_token_program: Program<'info, AssociatedToken>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitEngine>, args: InitEngineArgs) -> Result<()> {
    let config = args.config.unwrap_or_default();
    config.validate()?;
    require!(args.operator != Pubkey::default(), ErrorCode::InvalidAdmin);

    let engine_key = ctx.accounts.engine.key();
    let vault_key = ctx.accounts.vault.key();

    let engine = &mut ctx.accounts.engine;
    engine.admin = ctx.accounts.admin.key();
    engine.operator = args.operator;
    engine.mint = ctx.accounts.mint.key();
    engine.vault = vault_key;
    engine.bond_vault = ctx.accounts.bond_vault.key();
    engine.config = config;
    engine.ledger = PoolLedger::default();
    engine.level = 1;
    engine.active_runs = 0;
    engine.entropy = [0u8; 32];
    engine.entropy_status = EntropyStatus::Idle as u8;
    engine.entropy_requests = 0;
    engine.bump = ctx.bumps.engine;
    engine.reserved = [0u8; 32];

    let mut board = ctx.accounts.board.load_init()?;
    board.bump = ctx.bumps.board;
    board.reset_for_level(1);

    ctx.accounts.claimable_book.bump = ctx.bumps.claimable_book;
    ctx.accounts.claimable_book.len = 0;

    ctx.accounts.reward_queue.bump = ctx.bumps.reward_queue;
    ctx.accounts.reward_queue.queue = RewardQueue::default();

    emit!(EngineInitialized {
        engine: engine_key,
        admin: ctx.accounts.admin.key(),
        operator: args.operator,
        vault: vault_key,
    });

    Ok(())
}
