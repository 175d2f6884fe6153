use anchor_lang::prelude::*;

use crate::constants::REWARD_QUEUE_CAPACITY;
use crate::errors::ErrorCode;

/// Deferred non-monetary reward owed to a jackpot winner.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingReward {
    pub beneficiary: Pubkey,
    pub category: u16,
    pub level: u32,
}

/// Bounded FIFO drained in batches by an external processor.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardQueue {
    #[max_len(REWARD_QUEUE_CAPACITY)]
    pub items: Vec<PendingReward>,
    pub enqueued: u64,
    pub processed: u64,
}

impl RewardQueue {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ensure_room(&self) -> Result<()> {
        require!(self.items.len() < REWARD_QUEUE_CAPACITY, ErrorCode::RewardQueueFull);
        Ok(())
    }

    pub fn enqueue(&mut self, reward: PendingReward) -> Result<()> {
        self.ensure_room()?;
        self.items.push(reward);
        self.enqueued = self.enqueued.saturating_add(1);
        Ok(())
    }

    pub fn drain(&mut self, max: usize) -> Vec<PendingReward> {
        let n = max.min(self.items.len());
        let out: Vec<PendingReward> = self.items.drain(..n).collect();
        self.processed = self.processed.saturating_add(out.len() as u64);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(n: u8) -> PendingReward {
        PendingReward {
            beneficiary: Pubkey::new_from_array([n; 32]),
            category: n as u16,
            level: 1,
        }
    }

    #[test]
    fn drains_in_fifo_order() {
        let mut q = RewardQueue::default();
        for n in 0..5 {
            q.enqueue(reward(n)).unwrap();
        }
        let first = q.drain(2);
        assert_eq!(first, vec![reward(0), reward(1)]);
        assert_eq!(q.drain(10).len(), 3);
        assert!(q.is_empty());
        assert_eq!((q.enqueued, q.processed), (5, 5));
    }

    #[test]
    fn full_queue_rejects() {
        let mut q = RewardQueue::default();
        for _ in 0..REWARD_QUEUE_CAPACITY {
            q.enqueue(reward(1)).unwrap();
        }
        assert_eq!(q.enqueue(reward(2)).unwrap_err(), ErrorCode::RewardQueueFull.into());
    }
}
