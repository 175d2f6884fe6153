use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

use crate::constants::CATEGORY_COUNT;
use crate::engine::config::EngineConfig;
use crate::engine::decimator::ClaimRound;
use crate::engine::ledger::PoolLedger;
use crate::engine::rewards::RewardQueue;
use crate::engine::scan::JackpotRun;
use crate::errors::ErrorCode;

/// Wrapper for the per-category counters: bytemuck doesn't impl Pod for arbitrary array sizes.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct CategoryCounts {
    pub data: [u32; CATEGORY_COUNT],
}

unsafe impl Pod for CategoryCounts {}
unsafe impl Zeroable for CategoryCounts {}

#[cfg(feature = "idl-build")]
impl anchor_lang::IdlBuild for CategoryCounts {
    fn create_type() -> Option<anchor_lang::idl::types::IdlTypeDef> {
        use anchor_lang::idl::types::*;
        Some(IdlTypeDef {
            name: "CategoryCounts".to_string(),
            docs: vec![],
            serialization: IdlSerialization::Bytemuck,
            repr: Some(IdlRepr::C(IdlReprModifier { packed: false, align: None })),
            generics: vec![],
            ty: IdlTypeDefTy::Struct {
                fields: Some(IdlDefinedFields::Named(vec![IdlField {
                    name: "data".to_string(),
                    docs: vec![],
                    ty: IdlType::Array(Box::new(IdlType::U32), IdlArrayLen::Value(CATEGORY_COUNT)),
                }])),
            },
        })
    }
    fn insert_types(types: &mut std::collections::BTreeMap<String, anchor_lang::idl::types::IdlTypeDef>) {
        if let Some(ty) = Self::create_type() {
            types.insert("CategoryCounts".to_string(), ty);
        }
    }
    fn get_full_path() -> String {
        "CategoryCounts".to_string()
    }
}

#[repr(u8)]
pub enum EntropyStatus {
    Idle = 0,
    Requested = 1,
    Ready = 2,
}

/// Singleton engine account. Its PDA owns the token vault and signs every payout.
#[account]
#[derive(InitSpace, Default)]
pub struct Engine {
    pub admin: Pubkey,
    /// Upstream authority allowed to write populations and drive runs.
    pub operator: Pubkey,
    pub mint: Pubkey,
    pub vault: Pubkey,
    /// Token account of the bond instrument. Receives routed outflow.
    pub bond_vault: Pubkey,
    pub config: EngineConfig,
    pub ledger: PoolLedger,
    pub level: u32,
    /// Bit per run kind with a run in progress.
    pub active_runs: u8,
    pub entropy: [u8; 32],
    pub entropy_status: u8,
    pub entropy_requests: u64,
    pub bump: u8,
    pub reserved: [u8; 32],
}

impl Engine {
    pub const SPACE: usize = 8 + Engine::INIT_SPACE;

    pub fn is_admin(&self, key: &Pubkey) -> bool {
        *key == self.admin
    }

    pub fn is_operator(&self, key: &Pubkey) -> bool {
        *key == self.operator || self.is_admin(key)
    }

    /// Hands the admin role over. Returns the previous admin; the operator is unchanged.
    pub fn transfer_admin(&mut self, new_admin: Pubkey) -> Result<Pubkey> {
        require!(
            new_admin != Pubkey::default() && !self.is_admin(&new_admin),
            ErrorCode::InvalidAdmin
        );
        Ok(core::mem::replace(&mut self.admin, new_admin))
    }
}

/// Daily burn counters and the level's exterminated category.
/// Zero-copy: all instructions use `AccountLoader<'info, CategoryBoard>`.
#[account(zero_copy)]
#[repr(C)]
pub struct CategoryBoard {
    pub level: u32,
    pub exterminated: u16,
    pub has_exterminated: u8,
    pub bump: u8,
    pub daily_counts: CategoryCounts,
}

impl CategoryBoard {
    pub const SPACE: usize = 8 + core::mem::size_of::<CategoryBoard>();

    pub fn exterminated(&self) -> Option<u16> {
        (self.has_exterminated != 0).then_some(self.exterminated)
    }

    pub fn reset_for_level(&mut self, level: u32) {
        self.level = level;
        self.exterminated = 0;
        self.has_exterminated = 0;
        self.daily_counts.data = [0; CATEGORY_COUNT];
    }
}

/// One resumable run slot per kind. An idle slot holds `JackpotRun::default()`.
#[account]
#[derive(InitSpace)]
pub struct RunAccount {
    pub kind: u8,
    pub bump: u8,
    pub run: JackpotRun,
}

impl RunAccount {
    pub const SPACE: usize = 8 + RunAccount::INIT_SPACE;
}

/// Header of a (level, category) ticket table. `len` 32-byte participant ids follow it.
#[account]
#[derive(InitSpace)]
pub struct TicketPoolAccount {
    pub level: u32,
    pub category: u16,
    pub bump: u8,
    pub len: u32,
}

impl TicketPoolAccount {
    pub const HEADER_SPACE: usize = 8 + TicketPoolAccount::INIT_SPACE;
}

/// Header of a level's decimator table. Entries are kept sorted by participant.
#[account]
#[derive(InitSpace)]
pub struct DecimatorBookAccount {
    pub level: u32,
    pub bump: u8,
    pub frozen: bool,
    pub len: u32,
    pub round: ClaimRound,
}

impl DecimatorBookAccount {
    pub const HEADER_SPACE: usize = 8 + DecimatorBookAccount::INIT_SPACE;
}

/// Header of the claimable balance table. Records are kept sorted by owner.
#[account]
#[derive(InitSpace)]
pub struct ClaimableBookAccount {
    pub bump: u8,
    pub len: u32,
}

impl ClaimableBookAccount {
    pub const HEADER_SPACE: usize = 8 + ClaimableBookAccount::INIT_SPACE;
}

#[account]
#[derive(InitSpace)]
pub struct RewardQueueAccount {
    pub bump: u8,
    pub queue: RewardQueue,
}

impl RewardQueueAccount {
    pub const SPACE: usize = 8 + RewardQueueAccount::INIT_SPACE;
}
