//! The target → transit table a non-storing root builds from destination
//! advertisements. Every node in the DODAG advertises itself as target with
//! its preferred parent as transit; stitching those pairs together backward
//! yields the source route for any destination.

use heapless::Vec;

use crate::config::RPL_RELATIONS_BUFFER_COUNT;
use crate::lollipop::SequenceCounter;
use crate::time::{Duration, Instant};
use crate::wire::Address;

/// One advertised target → transit pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Relation {
    target: Address,
    transit: Address,
    sequence: SequenceCounter,
    expires_at: Instant,
}

impl core::fmt::Display for Relation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} via {} (seq {}, expires at {})",
            self.target,
            self.transit,
            self.sequence.value(),
            self.expires_at
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Relations {
    relations: Vec<Relation, { RPL_RELATIONS_BUFFER_COUNT }>,
}

impl Relations {
    /// Add a relation, updating in place when the target is already known.
    /// Returns whether the target was previously unknown.
    pub(crate) fn add_relation(
        &mut self,
        target: Address,
        transit: Address,
        sequence: SequenceCounter,
        now: Instant,
        lifetime: Duration,
    ) -> bool {
        let expires_at = now + lifetime;

        if let Some(relation) = self.relations.iter_mut().find(|r| r.target == target) {
            relation.transit = transit;
            relation.sequence = sequence;
            relation.expires_at = expires_at;
            return false;
        }

        let added = self
            .relations
            .push(Relation {
                target,
                transit,
                sequence,
                expires_at,
            })
            .is_ok();

        if !added {
            net_trace!("unable to add relation, buffer is full");
        }

        added
    }

    /// Return the advertised transit for a target, if there is one.
    pub(crate) fn find_transit(&self, target: Address) -> Option<Address> {
        self.relations
            .iter()
            .find(|r| r.target == target)
            .map(|r| r.transit)
    }

    /// Purge expired relations.
    ///
    /// Returns `true` when a relation was actually removed.
    pub(crate) fn flush(&mut self, now: Instant) -> bool {
        let len = self.relations.len();
        self.relations.retain(|r| {
            if r.expires_at <= now {
                net_trace!("removing relation {} (expired)", r);
                false
            } else {
                true
            }
        });
        self.relations.len() != len
    }

    /// Build the ordered hop list toward a destination by walking the
    /// transit chain backward from it. The walk ends at a target without a
    /// relation or at our own address; the list is then reversed into
    /// forwarding order, without a leading own-address hop.
    ///
    /// Returns `None` for an unknown destination, on a relation cycle, and
    /// when the hop list does not fit.
    pub(crate) fn source_route(
        &self,
        destination: Address,
        own_address: Address,
    ) -> Option<Vec<Address, { RPL_RELATIONS_BUFFER_COUNT }>> {
        self.find_transit(destination)?;

        let mut route = Vec::new();
        route.push(destination).ok()?;

        let mut cursor = destination;
        while let Some(transit) = self.find_transit(cursor) {
            if route.contains(&transit) {
                net_trace!("relation cycle while routing to {}", destination);
                return None;
            }

            route.push(transit).ok()?;

            if transit == own_address {
                break;
            }
            cursor = transit;
        }

        route.reverse();

        if route.first() == Some(&own_address) {
            route.remove(0);
        }

        Some(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(i: u16) -> Address {
        Address::new(0xfd00, 0, 0, 0, 0, 0, 0, i)
    }

    fn add(relations: &mut Relations, target: u16, transit: u16) {
        relations.add_relation(
            address(target),
            address(transit),
            SequenceCounter::default(),
            Instant::ZERO,
            Duration::from_secs(60 * 30),
        );
    }

    #[test]
    fn add_and_update_relation() {
        let mut relations = Relations::default();
        add(&mut relations, 4, 3);
        assert_eq!(relations.find_transit(address(4)), Some(address(3)));
        assert_eq!(relations.relations.len(), 1);

        add(&mut relations, 4, 2);
        assert_eq!(relations.find_transit(address(4)), Some(address(2)));
        assert_eq!(relations.relations.len(), 1);
    }

    #[test]
    fn full_buffer() {
        let mut relations = Relations::default();
        for i in 0..RPL_RELATIONS_BUFFER_COUNT as u16 + 1 {
            add(&mut relations, 100 + i, 1);
        }
        assert_eq!(relations.relations.len(), RPL_RELATIONS_BUFFER_COUNT);
    }

    #[test]
    fn flush_expired() {
        let mut relations = Relations::default();
        relations.add_relation(
            address(4),
            address(3),
            SequenceCounter::default(),
            Instant::ZERO,
            Duration::from_secs(60),
        );

        assert!(!relations.flush(Instant::from_secs(59)));
        assert!(relations.flush(Instant::from_secs(60)));
        assert_eq!(relations.find_transit(address(4)), None);
    }

    #[test]
    fn source_route_stops_at_unmapped_hop() {
        // P = 4 via Q = 3, Q via S = 2; S has no relation.
        let mut relations = Relations::default();
        add(&mut relations, 4, 3);
        add(&mut relations, 3, 2);

        let route = relations.source_route(address(4), address(1)).unwrap();
        assert_eq!(&route[..], &[address(2), address(3), address(4)]);
    }

    #[test]
    fn source_route_trims_own_leading_hop() {
        // Same chain, with S advertising the root as its transit.
        let mut relations = Relations::default();
        add(&mut relations, 4, 3);
        add(&mut relations, 3, 2);
        add(&mut relations, 2, 1);

        let route = relations.source_route(address(4), address(1)).unwrap();
        assert_eq!(&route[..], &[address(2), address(3), address(4)]);
    }

    #[test]
    fn source_route_unknown_destination() {
        let relations = Relations::default();
        assert_eq!(relations.source_route(address(4), address(1)), None);
    }

    #[test]
    fn source_route_detects_cycle() {
        let mut relations = Relations::default();
        add(&mut relations, 4, 3);
        add(&mut relations, 3, 4);

        assert_eq!(relations.source_route(address(4), address(1)), None);
    }
}
