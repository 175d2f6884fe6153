pub const BPS_DENOMINATOR: u64 = 10_000;

pub const SEED_ENGINE: &[u8] = b"engine";
pub const SEED_BOARD: &[u8] = b"board";
pub const SEED_RUN: &[u8] = b"run";
pub const SEED_TICKETS: &[u8] = b"tickets";
pub const SEED_DECIMATOR: &[u8] = b"decimator";
pub const SEED_CLAIMABLE: &[u8] = b"claimable";
pub const SEED_REWARDS: &[u8] = b"rewards";
pub const SEED_IDENTITY: &[u8] = b"identity";

/// Tiers per tiered run. Tier 0 is the solo tier and absorbs the rounding remainder.
pub const TIER_COUNT: usize = 4;
pub const SOLO_TIER: usize = 0;

pub const DEFAULT_TIER_SHARES_BPS: [u16; TIER_COUNT] = [4_000, 2_500, 2_000, 1_500];
pub const DEFAULT_BASE_WINNER_COUNTS: [u16; TIER_COUNT] = [1, 5, 12, 25];

/// Pool sizes (raw units) between which non-solo winner counts scale from 1x to `max_scale_bps`.
pub const DEFAULT_SCALE_FLOOR: u64 = 10_000_000_000;
pub const DEFAULT_SCALE_CEILING: u64 = 200_000_000_000;
pub const DEFAULT_MAX_SCALE_BPS: u32 = 40_000;
pub const DEFAULT_MAX_WINNERS: u16 = 250;
pub const DEFAULT_PAYOUT_UNIT: u64 = 1;

pub const DEFAULT_SOLO_BOND_BPS: u16 = 5_000;
pub const DEFAULT_BOND_WINNER_COUNT: u16 = 2;
pub const DEFAULT_BOND_MIRROR_BPS: u16 = 3_000;
pub const DEFAULT_BOND_REWARD_RETURN_BPS: u16 = 2_000;

/// One in `scatter_odds` tickets of the scatter category wins.
pub const DEFAULT_SCATTER_ODDS: u32 = 20;
pub const DEFAULT_WORK_BUDGET: u32 = 300;
/// Each unit of work may append one claimable record, so this bounds realloc growth per call.
pub const MAX_ONCHAIN_WORK_BUDGET: u32 = 200;

pub const CATEGORY_COUNT: usize = 256;
pub const QUADRANT_SIZE: usize = 64;
pub const QUADRANT_COUNT: usize = CATEGORY_COUNT / QUADRANT_SIZE;

pub const DECIMATOR_MIN_DENOM: u8 = 2;
pub const DECIMATOR_MAX_DENOM: u8 = 20;
pub const DECIMATOR_DENOM_COUNT: usize = (DECIMATOR_MAX_DENOM - DECIMATOR_MIN_DENOM + 1) as usize;
/// Sum of 2..=20: one weight bucket per (denominator, sub-bucket) pair.
pub const DECIMATOR_BUCKET_SLOTS: usize = 209;

pub const REWARD_QUEUE_CAPACITY: usize = 64;
pub const MAX_TICKETS_PER_INSERT: usize = 256;

/// Share of the current prize pool paid by each daily jackpot, indexed by day counter.
pub const DAILY_JACKPOT_BPS: [u16; 10] = [610, 677, 746, 813, 881, 949, 1017, 1085, 1153, 1225];

/// Exterminator cut of the current prize pool, boosted on levels ending in 4 (except level 4).
pub const EXTERMINATOR_BPS: u16 = 3_000;
pub const EXTERMINATOR_BOOSTED_BPS: u16 = 4_000;
