//! The candidate and backup parent sets. Both live in one fixed-capacity
//! structure; which set a neighbor belongs to is derived from its advertised
//! rank compared to our own, so the classification follows rank changes
//! without bookkeeping.

use heapless::Vec;

use crate::config::RPL_PARENTS_BUFFER_COUNT;
use crate::rank::Rank;
use crate::time::Instant;
use crate::wire::{Address, Dio};

/// A neighbor admitted into the parent sets.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Parent {
    address: Address,
    rank: Rank,
    dio: Dio,
    last_heard: Instant,
}

impl Parent {
    /// Create a parent record from its last-heard DIO.
    pub(crate) fn new(address: Address, dio: Dio, now: Instant) -> Self {
        Self {
            address,
            rank: Rank::new(dio.rank),
            dio,
            last_heard: now,
        }
    }

    /// Return the address of the parent.
    pub(crate) fn address(&self) -> Address {
        self.address
    }

    /// Return the last advertised Rank of the parent.
    pub(crate) fn rank(&self) -> Rank {
        self.rank
    }

    /// Return the last DIO heard from the parent. Promotion to preferred
    /// parent re-derives the DODAG parameters from it.
    pub(crate) fn dio(&self) -> &Dio {
        &self.dio
    }

    /// Return when the parent was last heard.
    pub(crate) fn last_heard(&self) -> Instant {
        self.last_heard
    }
}

#[derive(Debug, Default)]
pub(crate) struct ParentSet {
    parents: Vec<Parent, { RPL_PARENTS_BUFFER_COUNT }>,
}

impl ParentSet {
    /// Add a neighbor to the set, updating in place when it is already
    /// known. When the set is full, a neighbor with a lower rank than the
    /// current worst entry replaces it.
    pub(crate) fn add(&mut self, parent: Parent) {
        if let Some(entry) = self.find_mut(parent.address) {
            *entry = parent;
        } else if let Err(parent) = self.parents.push(parent) {
            match self.worst_mut() {
                Some(worst) if worst.rank > parent.rank => *worst = parent,
                _ => net_debug!("parent set full, {} not admitted", parent.address),
            }
        }
    }

    /// Find a parent based on its address.
    pub(crate) fn find(&self, address: Address) -> Option<&Parent> {
        self.parents.iter().find(|p| p.address == address)
    }

    /// Find a mutable parent based on its address.
    pub(crate) fn find_mut(&mut self, address: Address) -> Option<&mut Parent> {
        self.parents.iter_mut().find(|p| p.address == address)
    }

    /// Remove a parent based on its address. Removing an absent address is a
    /// no-op.
    pub(crate) fn remove(&mut self, address: Address) {
        self.parents.retain(|p| p.address != address);
    }

    /// Drop every entry with a rank above the given one. Called after an own
    /// rank change, when entries admitted earlier may no longer qualify for
    /// either set.
    pub(crate) fn purge_worse(&mut self, rank: Rank) {
        self.parents.retain(|p| p.rank <= rank);
    }

    /// Neighbors with a rank strictly below our own.
    pub(crate) fn candidates(&self, own_rank: Rank) -> impl Iterator<Item = &Parent> {
        self.parents.iter().filter(move |p| p.rank < own_rank)
    }

    /// Neighbors at the same rank as our own, usable as a fallback only.
    pub(crate) fn backups(&self, own_rank: Rank) -> impl Iterator<Item = &Parent> {
        self.parents.iter().filter(move |p| p.rank == own_rank)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    fn worst_mut(&mut self) -> Option<&mut Parent> {
        self.parents.iter_mut().max_by_key(|p| p.rank)
    }
}
