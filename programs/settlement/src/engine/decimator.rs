use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::constants::{
    DECIMATOR_BUCKET_SLOTS, DECIMATOR_DENOM_COUNT, DECIMATOR_MAX_DENOM, DECIMATOR_MIN_DENOM,
};
use crate::engine::entropy::Entropy;
use crate::errors::ErrorCode;
use crate::utils::{checked_add_u64, checked_sub_u64, mul_div};

/// One participant's burns for a level. `sub` is fixed by (participant, level, denom).
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecimatorEntry {
    pub participant: Pubkey,
    pub weight: u64,
    pub denom: u8,
    pub sub: u8,
    pub claimed: bool,
}

/// Pull-based payout record left behind by a finished decimator run.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimRound {
    pub level: u32,
    pub pool_amount: u64,
    pub total_weight: u64,
    pub claimed_amount: u64,
    pub active: bool,
    /// Winning sub-bucket per denominator, index 0 is denominator 2.
    pub winning_subs: [u8; DECIMATOR_DENOM_COUNT],
}

impl ClaimRound {
    pub fn winning_sub(&self, denom: u8) -> Option<u8> {
        denom
            .checked_sub(DECIMATOR_MIN_DENOM)
            .and_then(|i| self.winning_subs.get(i as usize).copied())
    }

    pub fn is_winner(&self, entry: &DecimatorEntry) -> bool {
        self.winning_sub(entry.denom) == Some(entry.sub)
    }

    pub fn unclaimed(&self) -> Result<u64> {
        checked_sub_u64(self.pool_amount, self.claimed_amount)
    }
}

/// Storage seam for a level's decimator entries and its claim round.
pub trait DecimatorRecords {
    fn level(&self) -> u32;
    fn is_frozen(&self) -> bool;
    fn set_frozen(&mut self, frozen: bool);
    fn claim_round(&self) -> &ClaimRound;
    fn claim_round_mut(&mut self) -> &mut ClaimRound;
    fn entry_count(&self) -> u32;
    fn entry_at(&self, index: u32) -> Result<DecimatorEntry>;
    fn find(&self, participant: &Pubkey) -> Result<Option<u32>>;
    fn put(&mut self, index: u32, entry: &DecimatorEntry) -> Result<()>;
    fn push(&mut self, entry: &DecimatorEntry) -> Result<()>;
}

pub fn validate_denom(denom: u8) -> Result<()> {
    require!(
        (DECIMATOR_MIN_DENOM..=DECIMATOR_MAX_DENOM).contains(&denom),
        ErrorCode::InvalidDenominator
    );
    Ok(())
}

pub fn sub_bucket(participant: &Pubkey, level: u32, denom: u8) -> u8 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(participant.as_ref());
    hasher.update(&level.to_le_bytes());
    hasher.update(&[denom]);
    let digest = hasher.finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(word) % denom.max(1) as u64) as u8
}

/// Flat index of a (denom, sub) weight bucket. Denominator `d` owns `d` consecutive slots.
pub fn bucket_index(denom: u8, sub: u8) -> Result<usize> {
    validate_denom(denom)?;
    require!(sub < denom, ErrorCode::InvalidDenominator);
    let d = denom as usize;
    let idx = (d - 1) * d / 2 - 1 + sub as usize;
    require!(idx < DECIMATOR_BUCKET_SLOTS, ErrorCode::InvalidDenominator);
    Ok(idx)
}

pub fn draw_winning_sub(base: &Entropy, denom: u8) -> Result<u8> {
    let sub = base
        .fork(b"decimator:sub", denom as u64)
        .bounded(denom as u64)
        .ok_or(ErrorCode::InvalidDenominator)?;
    Ok(sub as u8)
}

/// Adds `weight` for `participant`. A lower denominator than the one on record moves the
/// entry into that class.
pub fn record_burn(
    book: &mut dyn DecimatorRecords,
    participant: &Pubkey,
    weight: u64,
    denom: u8,
) -> Result<DecimatorEntry> {
    validate_denom(denom)?;
    require!(weight > 0, ErrorCode::ZeroWeight);
    require!(
        !book.is_frozen() && !book.claim_round().active,
        ErrorCode::DecimatorFrozen
    );

    let level = book.level();
    match book.find(participant)? {
        Some(index) => {
            let mut entry = book.entry_at(index)?;
            entry.weight = checked_add_u64(entry.weight, weight)?;
            if denom < entry.denom {
                entry.denom = denom;
                entry.sub = sub_bucket(participant, level, denom);
            }
            book.put(index, &entry)?;
            Ok(entry)
        }
        None => {
            let entry = DecimatorEntry {
                participant: *participant,
                weight,
                denom,
                sub: sub_bucket(participant, level, denom),
                claimed: false,
            };
            book.push(&entry)?;
            Ok(entry)
        }
    }
}

struct PreparedClaim {
    index: u32,
    entry: DecimatorEntry,
    amount: u64,
    claimed_after: u64,
}

fn prepare_claim(book: &dyn DecimatorRecords, claimant: &Pubkey) -> Result<PreparedClaim> {
    let round = *book.claim_round();
    require!(round.active, ErrorCode::ClaimRoundInactive);

    let index = book.find(claimant)?.ok_or(ErrorCode::NotAWinner)?;
    let entry = book.entry_at(index)?;
    require!(!entry.claimed, ErrorCode::AlreadyClaimed);
    require!(round.is_winner(&entry), ErrorCode::NotAWinner);

    let amount = mul_div(round.pool_amount, entry.weight, round.total_weight)?;
    let claimed_after = checked_add_u64(round.claimed_amount, amount)?;
    require!(claimed_after <= round.pool_amount, ErrorCode::PoolUnderflow);
    Ok(PreparedClaim {
        index,
        entry,
        amount,
        claimed_after,
    })
}

/// Share `claimant` would receive from the active claim round. Fails exactly when `claim` would.
pub fn claim_amount(book: &dyn DecimatorRecords, claimant: &Pubkey) -> Result<u64> {
    Ok(prepare_claim(book, claimant)?.amount)
}

/// Pays `claimant` their share of the active claim round exactly once.
pub fn claim(book: &mut dyn DecimatorRecords, claimant: &Pubkey) -> Result<u64> {
    let mut prepared = prepare_claim(&*book, claimant)?;
    prepared.entry.claimed = true;
    book.put(prepared.index, &prepared.entry)?;
    book.claim_round_mut().claimed_amount = prepared.claimed_after;
    Ok(prepared.amount)
}

/// Closes the active claim round and returns the amount nobody claimed.
pub fn close_round(book: &mut dyn DecimatorRecords) -> Result<u64> {
    let round = book.claim_round_mut();
    require!(round.active, ErrorCode::ClaimRoundInactive);
    let unclaimed = round.unclaimed()?;
    round.active = false;
    Ok(unclaimed)
}

/// In-memory decimator book for one level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecimatorBook {
    level: u32,
    frozen: bool,
    round: ClaimRound,
    entries: Vec<DecimatorEntry>,
    index: BTreeMap<Pubkey, u32>,
}

impl DecimatorBook {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[DecimatorEntry] {
        &self.entries
    }
}

impl DecimatorRecords for DecimatorBook {
    fn level(&self) -> u32 {
        self.level
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    fn claim_round(&self) -> &ClaimRound {
        &self.round
    }

    fn claim_round_mut(&mut self) -> &mut ClaimRound {
        &mut self.round
    }

    fn entry_count(&self) -> u32 {
        self.entries.len() as u32
    }

    fn entry_at(&self, index: u32) -> Result<DecimatorEntry> {
        self.entries
            .get(index as usize)
            .copied()
            .ok_or(ErrorCode::RecordOutOfRange.into())
    }

    fn find(&self, participant: &Pubkey) -> Result<Option<u32>> {
        Ok(self.index.get(participant).copied())
    }

    fn put(&mut self, index: u32, entry: &DecimatorEntry) -> Result<()> {
        let slot = self
            .entries
            .get_mut(index as usize)
            .ok_or(ErrorCode::RecordOutOfRange)?;
        *slot = *entry;
        Ok(())
    }

    fn push(&mut self, entry: &DecimatorEntry) -> Result<()> {
        self.index.insert(entry.participant, self.entries.len() as u32);
        self.entries.push(*entry);
        Ok(())
    }
}
