use anchor_lang::prelude::*;

#[event]
pub struct EngineInitialized {
    pub engine: Pubkey,
    pub admin: Pubkey,
    pub operator: Pubkey,
    pub vault: Pubkey,
}

#[event]
pub struct EngineConfigUpdated {
    pub admin: Pubkey,
}

#[event]
pub struct AdminTransferred {
    pub old_admin: Pubkey,
    pub new_admin: Pubkey,
}

#[event]
pub struct PoolFunded {
    pub funder: Pubkey,
    pub pool: u8,
    pub amount: u64,
    pub assets_held_after: u64,
}

#[event]
pub struct LevelAdvanced {
    pub level: u32,
    pub carried_to_reward: u64,
    pub prize_base: u64,
}

#[event]
pub struct TicketsAdded {
    pub level: u32,
    pub category: u16,
    pub added: u32,
    pub pool_len: u32,
}

#[event]
pub struct TicketPoolClosed {
    pub level: u32,
    pub category: u16,
}

#[event]
pub struct CategoryExterminated {
    pub level: u32,
    pub category: u16,
    pub exterminator: Pubkey,
    pub payout: u64,
}

#[event]
pub struct DecimatorBurnRecorded {
    pub level: u32,
    pub participant: Pubkey,
    pub weight_total: u64,
    pub denom: u8,
    pub sub: u8,
}

#[event]
pub struct EntropyRequested {
    pub request: u64,
    pub payer: Pubkey,
}

#[event]
pub struct EntropyFulfilled {
    pub request: u64,
    pub entropy: [u8; 32],
}

#[event]
pub struct RunProgressed {
    pub kind: u8,
    pub level: u32,
    pub phase: u8,
    pub cursor_start: u32,
    pub cursor_end: u32,
    pub work_used: u32,
    pub winners: u32,
    pub direct_paid: u64,
    pub bond_routed: u64,
    pub bond_outflow: u64,
}

#[event]
pub struct RunFinished {
    pub kind: u8,
    pub level: u32,
    pub pool_remainder: u64,
    pub reserved_for_claims: u64,
}

#[event]
pub struct RunAborted {
    pub kind: u8,
    pub level: u32,
    pub admin: Pubkey,
    pub refund: u64,
}

#[event]
pub struct DecimatorClaimed {
    pub level: u32,
    pub claimant: Pubkey,
    pub amount: u64,
}

#[event]
pub struct ClaimRoundPruned {
    pub level: u32,
    pub unclaimed: u64,
}

#[event]
pub struct Withdrawn {
    pub owner: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RewardDequeued {
    pub beneficiary: Pubkey,
    pub category: u16,
    pub level: u32,
}
