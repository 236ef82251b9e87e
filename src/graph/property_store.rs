//! Slot-allocated record storage
//!
//! Nodes and relationships live in flat arenas addressed by their id. A freed
//! slot becomes a tombstone: its id is retired for the rest of the session and
//! is never handed out again, so ids held by callers stay unambiguous.

use super::store::{GraphError, GraphResult};

#[derive(Debug, Clone)]
enum Slot<R> {
    /// Allocated, not yet written
    Reserved,
    Live(R),
    Tombstone,
}

/// Arena of records with tombstoned deletion
#[derive(Debug, Clone)]
pub struct PropertyStore<R> {
    slots: Vec<Slot<R>>,
    live: usize,
}

impl<R> PropertyStore<R> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Allocate the next slot id. Ids are handed out strictly in increasing order.
    pub fn allocate(&mut self) -> u64 {
        self.slots.push(Slot::Reserved);
        (self.slots.len() - 1) as u64
    }

    /// Allocate a slot and write `record` into it
    pub fn insert(&mut self, record: R) -> u64 {
        self.slots.push(Slot::Live(record));
        self.live += 1;
        (self.slots.len() - 1) as u64
    }

    /// Append a slot that is retired from the start (snapshot restore)
    pub fn push_tombstone(&mut self) -> u64 {
        self.slots.push(Slot::Tombstone);
        (self.slots.len() - 1) as u64
    }

    /// Tombstone a slot, returning the record it held
    pub fn free(&mut self, slot: u64) -> GraphResult<Option<R>> {
        let entry = self.slot_mut(slot)?;
        if let Slot::Live(record) = std::mem::replace(entry, Slot::Tombstone) {
            self.live -= 1;
            return Ok(Some(record));
        }
        Ok(None)
    }

    pub fn read(&self, slot: u64) -> GraphResult<&R> {
        match self.slots.get(slot as usize) {
            Some(Slot::Live(record)) => Ok(record),
            _ => Err(GraphError::OutOfRange(slot)),
        }
    }

    pub fn read_mut(&mut self, slot: u64) -> GraphResult<&mut R> {
        match self.slots.get_mut(slot as usize) {
            Some(Slot::Live(record)) => Ok(record),
            _ => Err(GraphError::OutOfRange(slot)),
        }
    }

    /// Write a record into an allocated or live slot, returning the previous record
    pub fn write(&mut self, slot: u64, record: R) -> GraphResult<Option<R>> {
        let entry = self.slot_mut(slot)?;
        match std::mem::replace(entry, Slot::Live(record)) {
            Slot::Live(previous) => Ok(Some(previous)),
            _ => {
                self.live += 1;
                Ok(None)
            }
        }
    }

    pub fn is_live(&self, slot: u64) -> bool {
        matches!(self.slots.get(slot as usize), Some(Slot::Live(_)))
    }

    pub fn is_tombstone(&self, slot: u64) -> bool {
        matches!(self.slots.get(slot as usize), Some(Slot::Tombstone))
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated, tombstones included
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live records in slot order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &R)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Live(record) => Some((i as u64, record)),
            _ => None,
        })
    }

    /// Every slot in order, `None` for tombstoned or unwritten ones
    pub fn slots(&self) -> impl Iterator<Item = Option<&R>> + '_ {
        self.slots.iter().map(|slot| match slot {
            Slot::Live(record) => Some(record),
            _ => None,
        })
    }

    fn slot_mut(&mut self, slot: u64) -> GraphResult<&mut Slot<R>> {
        match self.slots.get_mut(slot as usize) {
            Some(entry @ (Slot::Live(_) | Slot::Reserved)) => Ok(entry),
            _ => Err(GraphError::OutOfRange(slot)),
        }
    }
}

impl<R> Default for PropertyStore<R> {
    fn default() -> Self {
        Self::new()
    }
}
