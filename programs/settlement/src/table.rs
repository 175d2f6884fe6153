//! Fixed-size record tables stored after an Anchor account header.
//!
//! The header is a normal `#[account]` struct carrying `len`; records are Borsh encoded at
//! `HEADER_SPACE + index * SIZE` and never pass through the account (de)serializer, so a table
//! can outgrow the heap. Keyed tables keep records sorted by their leading 32-byte key.

use core::cmp::Ordering;
use core::ops::Range;

use anchor_lang::prelude::*;

use crate::constants::SEED_TICKETS;
use crate::engine::decimator::{ClaimRound, DecimatorEntry, DecimatorRecords};
use crate::engine::ledger::ClaimableLedger;
use crate::engine::tickets::TicketSource;
use crate::errors::ErrorCode;
use crate::state::{ClaimableBookAccount, DecimatorBookAccount, TicketPoolAccount};
use crate::utils::{checked_add_u64, ensure_account_len};

pub trait TableRecord: AnchorSerialize + AnchorDeserialize {
    const SIZE: usize;
}

impl TableRecord for Pubkey {
    const SIZE: usize = 32;
}

impl TableRecord for DecimatorEntry {
    const SIZE: usize = DecimatorEntry::INIT_SPACE;
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimableRecord {
    pub owner: Pubkey,
    pub amount: u64,
}

impl TableRecord for ClaimableRecord {
    const SIZE: usize = ClaimableRecord::INIT_SPACE;
}

/// Account length holding `count` records.
pub fn table_len<R: TableRecord>(offset: usize, count: u32) -> usize {
    offset + R::SIZE * count as usize
}

pub fn capacity<R: TableRecord>(data_len: usize, offset: usize) -> u32 {
    (data_len.saturating_sub(offset) / R::SIZE) as u32
}

fn span<R: TableRecord>(offset: usize, index: u32) -> Range<usize> {
    let start = offset + R::SIZE * index as usize;
    start..start + R::SIZE
}

pub fn read_record<R: TableRecord>(data: &[u8], offset: usize, index: u32) -> Result<R> {
    let mut bytes = data
        .get(span::<R>(offset, index))
        .ok_or(ErrorCode::RecordOutOfRange)?;
    R::deserialize(&mut bytes).map_err(|_| ErrorCode::RecordOutOfRange.into())
}

pub fn write_record<R: TableRecord>(
    data: &mut [u8],
    offset: usize,
    index: u32,
    record: &R,
) -> Result<()> {
    let mut out = data
        .get_mut(span::<R>(offset, index))
        .ok_or(ErrorCode::RecordOutOfRange)?;
    record
        .serialize(&mut out)
        .map_err(|_| ErrorCode::RecordOutOfRange)?;
    Ok(())
}

/// Binary search on the leading key. `Err` carries the insertion index.
pub fn search_key<R: TableRecord>(
    data: &[u8],
    offset: usize,
    len: u32,
    key: &Pubkey,
) -> Result<core::result::Result<u32, u32>> {
    let (mut lo, mut hi) = (0u32, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let start = span::<R>(offset, mid).start;
        let probe = data
            .get(start..start + 32)
            .ok_or(ErrorCode::RecordOutOfRange)?;
        match probe.cmp(key.as_ref()) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return Ok(Ok(mid)),
        }
    }
    Ok(Err(lo))
}

/// Shifts records `index..len` up by one and writes `record` at `index`.
pub fn insert_record<R: TableRecord>(
    data: &mut [u8],
    offset: usize,
    len: u32,
    index: u32,
    record: &R,
) -> Result<()> {
    require!(capacity::<R>(data.len(), offset) > len, ErrorCode::TableFull);
    require!(index <= len, ErrorCode::RecordOutOfRange);
    let start = span::<R>(offset, index).start;
    let end = table_len::<R>(offset, len);
    data.copy_within(start..end, start + R::SIZE);
    write_record(data, offset, index, record)
}

pub fn remove_record<R: TableRecord>(
    data: &mut [u8],
    offset: usize,
    len: u32,
    index: u32,
) -> Result<()> {
    require!(index < len, ErrorCode::RecordOutOfRange);
    let start = span::<R>(offset, index).start;
    let end = table_len::<R>(offset, len);
    data.copy_within(start + R::SIZE..end, start);
    Ok(())
}

/// Appends `records` after the first `len`. Returns the new length.
pub fn append_records<R: TableRecord>(
    data: &mut [u8],
    offset: usize,
    len: u32,
    records: &[R],
) -> Result<u32> {
    let new_len = len
        .checked_add(records.len() as u32)
        .ok_or(ErrorCode::MathOverflow)?;
    require!(capacity::<R>(data.len(), offset) >= new_len, ErrorCode::TableFull);
    for (i, record) in records.iter().enumerate() {
        write_record(data, offset, len + i as u32, record)?;
    }
    Ok(new_len)
}

struct PoolSlice<'info> {
    category: u16,
    len: u32,
    info: AccountInfo<'info>,
}

/// Read-only view over the ticket pools of one level passed in `remaining_accounts`.
/// A pool PDA that was never initialized counts as empty.
pub struct LevelPools<'info> {
    pools: Vec<PoolSlice<'info>>,
}

impl<'info> LevelPools<'info> {
    pub fn load(level: u32, categories: &[u16], accounts: &[AccountInfo<'info>]) -> Result<Self> {
        let mut pools: Vec<PoolSlice<'info>> = Vec::with_capacity(categories.len());
        for &category in categories {
            if pools.iter().any(|p| p.category == category) {
                continue;
            }
            let (address, _) = Pubkey::find_program_address(
                &[SEED_TICKETS, &level.to_le_bytes(), &category.to_le_bytes()],
                &crate::ID,
            );
            let info = accounts
                .iter()
                .find(|a| *a.key == address)
                .ok_or(ErrorCode::InvalidTicketPool)?;

            let len = if info.data_is_empty() {
                0
            } else {
                require_keys_eq!(*info.owner, crate::ID, ErrorCode::InvalidTicketPool);
                let data = info.try_borrow_data()?;
                let header = TicketPoolAccount::try_deserialize(&mut &data[..])?;
                require!(
                    header.level == level && header.category == category,
                    ErrorCode::InvalidTicketPool
                );
                header.len
            };
            pools.push(PoolSlice {
                category,
                len,
                info: info.clone(),
            });
        }
        Ok(Self { pools })
    }

    fn pool(&self, category: u16) -> Option<&PoolSlice<'info>> {
        self.pools.iter().find(|p| p.category == category)
    }
}

impl TicketSource for LevelPools<'_> {
    fn population(&self, category: u16) -> u32 {
        self.pool(category).map_or(0, |p| p.len)
    }

    fn ticket_at(&self, category: u16, index: u32) -> Result<Pubkey> {
        let pool = self.pool(category).ok_or(ErrorCode::InvalidTicketPool)?;
        require!(index < pool.len, ErrorCode::RecordOutOfRange);
        let data = pool.info.try_borrow_data()?;
        read_record::<Pubkey>(&data[..], TicketPoolAccount::HEADER_SPACE, index)
    }
}

pub struct ClaimableTable<'a, 'info> {
    header: &'a mut ClaimableBookAccount,
    info: AccountInfo<'info>,
}

impl<'a, 'info> ClaimableTable<'a, 'info> {
    const OFFSET: usize = ClaimableBookAccount::HEADER_SPACE;

    pub fn new(account: &'a mut Account<'info, ClaimableBookAccount>) -> Self {
        let info = account.to_account_info();
        Self {
            header: &mut **account,
            info,
        }
    }

    /// Grows the account so `extra` new owners fit without another realloc.
    pub fn reserve(
        &self,
        payer: &AccountInfo<'info>,
        system_program: &AccountInfo<'info>,
        extra: u32,
    ) -> Result<()> {
        let count = self.header.len.saturating_add(extra);
        ensure_account_len(
            &self.info,
            payer,
            system_program,
            table_len::<ClaimableRecord>(Self::OFFSET, count),
        )
    }
}

impl ClaimableLedger for ClaimableTable<'_, '_> {
    fn credit(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let len = self.header.len;
        let mut data = self.info.try_borrow_mut_data()?;
        match search_key::<ClaimableRecord>(&data[..], Self::OFFSET, len, owner)? {
            Ok(i) => {
                let mut record = read_record::<ClaimableRecord>(&data[..], Self::OFFSET, i)?;
                record.amount = checked_add_u64(record.amount, amount)?;
                write_record(&mut data[..], Self::OFFSET, i, &record)
            }
            Err(i) => {
                let record = ClaimableRecord {
                    owner: *owner,
                    amount,
                };
                insert_record(&mut data[..], Self::OFFSET, len, i, &record)?;
                self.header.len = len + 1;
                Ok(())
            }
        }
    }

    fn take(&mut self, owner: &Pubkey) -> Result<u64> {
        let len = self.header.len;
        let mut data = self.info.try_borrow_mut_data()?;
        let index = search_key::<ClaimableRecord>(&data[..], Self::OFFSET, len, owner)?
            .map_err(|_| ErrorCode::NothingToWithdraw)?;
        let record = read_record::<ClaimableRecord>(&data[..], Self::OFFSET, index)?;
        remove_record::<ClaimableRecord>(&mut data[..], Self::OFFSET, len, index)?;
        self.header.len = len - 1;
        require!(record.amount > 0, ErrorCode::NothingToWithdraw);
        Ok(record.amount)
    }
}

pub struct DecimatorTable<'a, 'info> {
    header: &'a mut DecimatorBookAccount,
    info: AccountInfo<'info>,
}

impl<'a, 'info> DecimatorTable<'a, 'info> {
    const OFFSET: usize = DecimatorBookAccount::HEADER_SPACE;

    pub fn new(account: &'a mut Account<'info, DecimatorBookAccount>) -> Self {
        let info = account.to_account_info();
        Self {
            header: &mut **account,
            info,
        }
    }

    pub fn reserve(
        &self,
        payer: &AccountInfo<'info>,
        system_program: &AccountInfo<'info>,
        extra: u32,
    ) -> Result<()> {
        let count = self.header.len.saturating_add(extra);
        ensure_account_len(
            &self.info,
            payer,
            system_program,
            table_len::<DecimatorEntry>(Self::OFFSET, count),
        )
    }
}

impl DecimatorRecords for DecimatorTable<'_, '_> {
    fn level(&self) -> u32 {
        self.header.level
    }

    fn is_frozen(&self) -> bool {
        self.header.frozen
    }

    fn set_frozen(&mut self, frozen: bool) {
        self.header.frozen = frozen;
    }

    fn claim_round(&self) -> &ClaimRound {
        &self.header.round
    }

    fn claim_round_mut(&mut self) -> &mut ClaimRound {
        &mut self.header.round
    }

    fn entry_count(&self) -> u32 {
        self.header.len
    }

    fn entry_at(&self, index: u32) -> Result<DecimatorEntry> {
        require!(index < self.header.len, ErrorCode::RecordOutOfRange);
        let data = self.info.try_borrow_data()?;
        read_record(&data[..], Self::OFFSET, index)
    }

    fn find(&self, participant: &Pubkey) -> Result<Option<u32>> {
        let data = self.info.try_borrow_data()?;
        Ok(search_key::<DecimatorEntry>(&data[..], Self::OFFSET, self.header.len, participant)?.ok())
    }

    fn put(&mut self, index: u32, entry: &DecimatorEntry) -> Result<()> {
        require!(index < self.header.len, ErrorCode::RecordOutOfRange);
        let mut data = self.info.try_borrow_mut_data()?;
        write_record(&mut data[..], Self::OFFSET, index, entry)
    }

    fn push(&mut self, entry: &DecimatorEntry) -> Result<()> {
        let len = self.header.len;
        let mut data = self.info.try_borrow_mut_data()?;
        let index = match search_key::<DecimatorEntry>(&data[..], Self::OFFSET, len, &entry.participant)? {
            Ok(i) => return write_record(&mut data[..], Self::OFFSET, i, entry),
            Err(i) => i,
        };
        insert_record(&mut data[..], Self::OFFSET, len, index, entry)?;
        self.header.len = len + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSET: usize = 13;

    fn key(n: u8) -> Pubkey {
        Pubkey::new_from_array([n; 32])
    }

    fn buffer(records: u32) -> Vec<u8> {
        vec![0u8; table_len::<ClaimableRecord>(OFFSET, records)]
    }

    fn insert(data: &mut [u8], len: &mut u32, owner: u8, amount: u64) {
        let record = ClaimableRecord {
            owner: key(owner),
            amount,
        };
        let at = search_key::<ClaimableRecord>(data, OFFSET, *len, &record.owner)
            .unwrap()
            .unwrap_err();
        insert_record(data, OFFSET, *len, at, &record).unwrap();
        *len += 1;
    }

    #[test]
    fn inserts_keep_keys_sorted() {
        let mut data = buffer(4);
        let mut len = 0;
        for (owner, amount) in [(9, 90), (3, 30), (7, 70), (1, 10)] {
            insert(&mut data, &mut len, owner, amount);
        }
        let owners: Vec<Pubkey> = (0..len)
            .map(|i| read_record::<ClaimableRecord>(&data, OFFSET, i).unwrap().owner)
            .collect();
        assert_eq!(owners, vec![key(1), key(3), key(7), key(9)]);
        assert_eq!(
            search_key::<ClaimableRecord>(&data, OFFSET, len, &key(7)).unwrap(),
            Ok(2)
        );
        assert_eq!(
            search_key::<ClaimableRecord>(&data, OFFSET, len, &key(5)).unwrap(),
            Err(2)
        );
    }

    #[test]
    fn full_table_rejects_insert() {
        let mut data = buffer(1);
        let mut len = 0;
        insert(&mut data, &mut len, 1, 1);
        let record = ClaimableRecord {
            owner: key(2),
            amount: 2,
        };
        assert_eq!(
            insert_record(&mut data, OFFSET, len, 1, &record).unwrap_err(),
            ErrorCode::TableFull.into()
        );
    }

    #[test]
    fn remove_closes_the_gap() {
        let mut data = buffer(3);
        let mut len = 0;
        for owner in [1, 2, 3] {
            insert(&mut data, &mut len, owner, owner as u64);
        }
        remove_record::<ClaimableRecord>(&mut data, OFFSET, len, 0).unwrap();
        len -= 1;
        assert_eq!(read_record::<ClaimableRecord>(&data, OFFSET, 0).unwrap().owner, key(2));
        assert_eq!(read_record::<ClaimableRecord>(&data, OFFSET, 1).unwrap().owner, key(3));
        assert!(remove_record::<ClaimableRecord>(&mut data, OFFSET, len, 2).is_err());
    }

    #[test]
    fn append_respects_capacity() {
        let mut data = vec![0u8; table_len::<Pubkey>(OFFSET, 3)];
        let len = append_records(&mut data, OFFSET, 0, &[key(1), key(2)]).unwrap();
        assert_eq!(len, 2);
        assert_eq!(read_record::<Pubkey>(&data, OFFSET, 1).unwrap(), key(2));
        assert_eq!(
            append_records(&mut data, OFFSET, len, &[key(3), key(4)]).unwrap_err(),
            ErrorCode::TableFull.into()
        );
    }

    #[test]
    fn record_sizes_match_layout() {
        assert_eq!(ClaimableRecord::SIZE, 40);
        assert_eq!(DecimatorEntry::SIZE, 43);
        let mut data = vec![0u8; table_len::<DecimatorEntry>(0, 1)];
        let entry = DecimatorEntry {
            participant: key(4),
            weight: 77,
            denom: 5,
            sub: 3,
            claimed: true,
        };
        write_record(&mut data, 0, 0, &entry).unwrap();
        assert_eq!(&data[..32], key(4).as_ref());
        assert_eq!(read_record::<DecimatorEntry>(&data, 0, 0).unwrap(), entry);
    }
}
