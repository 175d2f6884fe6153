use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::constants::{CATEGORY_COUNT, QUADRANT_COUNT, QUADRANT_SIZE};
use crate::engine::entropy::Entropy;
use crate::errors::ErrorCode;

/// Read access to one level's ticket pools.
pub trait TicketSource {
    fn population(&self, category: u16) -> u32;
    fn ticket_at(&self, category: u16, index: u32) -> Result<Pubkey>;
}

/// Append-only list of ticket holders for one (level, category). Duplicates carry extra weight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketPool {
    entries: Vec<Pubkey>,
}

impl TicketPool {
    pub fn insert_many(&mut self, ids: &[Pubkey]) {
        self.entries.extend_from_slice(ids);
    }

    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Pubkey> {
        self.entries.get(index as usize)
    }
}

pub fn validate_category(category: u16) -> Result<()> {
    require!((category as usize) < CATEGORY_COUNT, ErrorCode::InvalidCategory);
    Ok(())
}

/// Host-side store of every level's ticket pools plus the per-category counters for the
/// running day.
#[derive(Clone, Debug)]
pub struct TicketBook {
    pools: BTreeMap<(u32, u16), TicketPool>,
    daily_counts: [u32; CATEGORY_COUNT],
    exterminated: BTreeMap<u32, u16>,
}

impl Default for TicketBook {
    fn default() -> Self {
        Self {
            pools: BTreeMap::new(),
            daily_counts: [0; CATEGORY_COUNT],
            exterminated: BTreeMap::new(),
        }
    }
}

impl TicketBook {
    pub fn insert_many(&mut self, level: u32, category: u16, ids: &[Pubkey]) -> Result<()> {
        validate_category(category)?;
        self.pools
            .entry((level, category))
            .or_default()
            .insert_many(ids);
        let counter = &mut self.daily_counts[category as usize];
        *counter = counter.saturating_add(ids.len() as u32);
        Ok(())
    }

    pub fn pool(&self, level: u32, category: u16) -> Option<&TicketPool> {
        self.pools.get(&(level, category))
    }

    pub fn daily_counts(&self) -> &[u32; CATEGORY_COUNT] {
        &self.daily_counts
    }

    pub fn reset_daily_counts(&mut self) {
        self.daily_counts = [0; CATEGORY_COUNT];
    }

    pub fn exterminated(&self, level: u32) -> Option<u16> {
        self.exterminated.get(&level).copied()
    }

    pub fn mark_exterminated(&mut self, level: u32, category: u16) -> Result<()> {
        validate_category(category)?;
        require!(
            !self.exterminated.contains_key(&level),
            ErrorCode::AlreadyExterminated
        );
        self.exterminated.insert(level, category);
        Ok(())
    }

    /// Drops every pool of `level`. Returns the number of pools removed.
    pub fn clear_level(&mut self, level: u32) -> usize {
        let before = self.pools.len();
        self.pools.retain(|(l, _), _| *l != level);
        self.exterminated.remove(&level);
        before - self.pools.len()
    }

    pub fn level(&self, level: u32) -> LevelTickets<'_> {
        LevelTickets { book: self, level }
    }
}

pub struct LevelTickets<'a> {
    book: &'a TicketBook,
    level: u32,
}

impl TicketSource for LevelTickets<'_> {
    fn population(&self, category: u16) -> u32 {
        self.book
            .pool(self.level, category)
            .map_or(0, TicketPool::len)
    }

    fn ticket_at(&self, category: u16, index: u32) -> Result<Pubkey> {
        self.book
            .pool(self.level, category)
            .and_then(|p| p.get(index))
            .copied()
            .ok_or(ErrorCode::RecordOutOfRange.into())
    }
}

fn quadrant(counts: &[u32; CATEGORY_COUNT], q: usize) -> &[u32] {
    &counts[q * QUADRANT_SIZE..(q + 1) * QUADRANT_SIZE]
}

/// Index of the largest total, lowest index on ties.
fn argmax(totals: &[u64]) -> usize {
    let mut best = 0usize;
    for (i, t) in totals.iter().enumerate() {
        if *t > totals[best] {
            best = i;
        }
    }
    best
}

/// One winning category per quadrant. Inside a quadrant a category is `(color << 3) | symbol`.
/// Quadrant 0 takes the most-burned symbol with a random color and quadrant 1 the most-burned
/// color with a random symbol. Quadrant 2 takes its most-burned category; quadrant 3 is random.
pub fn winning_categories(counts: &[u32; CATEGORY_COUNT], entropy: &Entropy) -> [u16; QUADRANT_COUNT] {
    let bits = entropy.low_u64();

    let mut symbols = [0u64; 8];
    for (i, c) in quadrant(counts, 0).iter().enumerate() {
        symbols[i & 7] += *c as u64;
    }
    let mut colors = [0u64; 8];
    for (i, c) in quadrant(counts, 1).iter().enumerate() {
        colors[i >> 3] += *c as u64;
    }
    let traits: Vec<u64> = quadrant(counts, 2).iter().map(|c| *c as u64).collect();

    let q0 = (((bits & 7) as usize) << 3) | argmax(&symbols);
    let q1 = (argmax(&colors) << 3) | ((bits >> 3) & 7) as usize;
    let q2 = argmax(&traits);
    let q3 = ((bits >> 6) & 63) as usize;
    [
        q0 as u16,
        (QUADRANT_SIZE + q1) as u16,
        (2 * QUADRANT_SIZE + q2) as u16,
        (3 * QUADRANT_SIZE + q3) as u16,
    ]
}
