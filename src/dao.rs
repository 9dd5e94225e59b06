//! Reliability tracking for destination advertisements sent with the
//! ack-required flag. Each advertised destination has at most one pending
//! entry; the engine drives retries and decides when an advertisement is
//! lost.

use heapless::Vec;

use crate::config::RPL_DAOS_BUFFER_COUNT;
use crate::lollipop::SequenceCounter;
use crate::rand::Rand;
use crate::time::{Duration, Instant};
use crate::wire::Address;

/// A destination advertisement awaiting acknowledgment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingDao {
    pub(crate) destination: Address,
    pub(crate) sequence: SequenceCounter,
    pub(crate) ack_required: bool,
    pub(crate) target: Option<Address>,
    pub(crate) transit: Option<Address>,
    pub(crate) retries: u8,
    /// Deadline for the acknowledgment, re-armed on every send.
    pub(crate) timeout: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct DaoTracker {
    daos: Vec<PendingDao, { RPL_DAOS_BUFFER_COUNT }>,
    ack_timeout: Duration,
    dropped: usize,
}

impl DaoTracker {
    pub(crate) fn new(ack_timeout: Duration) -> Self {
        Self {
            daos: Vec::new(),
            ack_timeout,
            dropped: 0,
        }
    }

    /// Record an advertisement sent with the ack-required flag, arming its
    /// deadline between three and four ack timeouts from now. An existing
    /// entry for the destination keeps its retry count and gets the fresh
    /// deadline only.
    pub(crate) fn send_with_ack(
        &mut self,
        destination: Address,
        sequence: SequenceCounter,
        target: Option<Address>,
        transit: Option<Address>,
        now: Instant,
        rand: &mut Rand,
    ) {
        let timeout = self.next_timeout(now, rand);

        if let Some(entry) = self.find_mut(destination) {
            entry.sequence = sequence;
            entry.target = target;
            entry.transit = transit;
            entry.timeout = timeout;
            return;
        }

        let entry = PendingDao {
            destination,
            sequence,
            ack_required: true,
            target,
            transit,
            retries: 0,
            timeout,
        };

        if self.daos.push(entry).is_err() {
            net_debug!("DAO table full, {} sent unacknowledged", destination);
        }
    }

    /// Process an acknowledgment: erase the matching entry. Acknowledgments
    /// that match no pending destination and sequence are ignored.
    pub(crate) fn on_ack(&mut self, destination: Address, sequence: SequenceCounter) {
        let matched = self
            .daos
            .iter()
            .any(|dao| dao.destination == destination && dao.sequence == sequence);

        if matched {
            self.daos
                .retain(|dao| !(dao.destination == destination && dao.sequence == sequence));
        } else {
            net_trace!("DAO-ACK for {} does not match a pending DAO", destination);
        }
    }

    /// Return the destination of one entry whose deadline has passed.
    pub(crate) fn next_expired(&self, now: Instant) -> Option<Address> {
        self.daos
            .iter()
            .find(|dao| dao.timeout <= now)
            .map(|dao| dao.destination)
    }

    pub(crate) fn find(&self, destination: Address) -> Option<&PendingDao> {
        self.daos.iter().find(|dao| dao.destination == destination)
    }

    fn find_mut(&mut self, destination: Address) -> Option<&mut PendingDao> {
        self.daos
            .iter_mut()
            .find(|dao| dao.destination == destination)
    }

    /// Bump the retry count of an entry, returning the new count.
    pub(crate) fn increment_retries(&mut self, destination: Address) -> Option<u8> {
        let entry = self.find_mut(destination)?;
        entry.retries += 1;
        Some(entry.retries)
    }

    /// Erase an entry without counting it as lost.
    pub(crate) fn remove(&mut self, destination: Address) {
        self.daos.retain(|dao| dao.destination != destination);
    }

    /// Erase an entry and count the advertisement as lost.
    pub(crate) fn mark_dropped(&mut self, destination: Address) {
        self.remove(destination);
        self.dropped += 1;
    }

    /// Number of advertisements given up on after exhausting their retries.
    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }

    /// Erase every entry. The dropped counter is kept.
    pub(crate) fn clear(&mut self) {
        self.daos.clear();
    }

    /// Return the earliest pending deadline.
    pub(crate) fn poll_at(&self) -> Option<Instant> {
        self.daos.iter().map(|dao| dao.timeout).min()
    }

    fn next_timeout(&self, now: Instant, rand: &mut Rand) -> Instant {
        now + self.ack_timeout * 3
            + Duration::from_micros(rand.rand_u32() as u64 % self.ack_timeout.total_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (DaoTracker, Rand) {
        (
            DaoTracker::new(Duration::from_secs(2)),
            Rand::new(0xfade_cafe_0123_4567),
        )
    }

    fn dest(i: u16) -> Address {
        Address::new(0xfd00, 0, 0, 0, 0, 0, 0, i)
    }

    #[test]
    fn deadline_is_between_three_and_four_timeouts() {
        let (mut tracker, mut rand) = tracker();
        tracker.send_with_ack(
            dest(1),
            SequenceCounter::default(),
            None,
            None,
            Instant::ZERO,
            &mut rand,
        );

        let deadline = tracker.poll_at().unwrap();
        assert!(deadline >= Instant::ZERO + Duration::from_secs(6));
        assert!(deadline < Instant::ZERO + Duration::from_secs(8));
    }

    #[test]
    fn resend_keeps_the_retry_count() {
        let (mut tracker, mut rand) = tracker();
        tracker.send_with_ack(
            dest(1),
            SequenceCounter::default(),
            None,
            None,
            Instant::ZERO,
            &mut rand,
        );
        assert_eq!(tracker.increment_retries(dest(1)), Some(1));

        tracker.send_with_ack(
            dest(1),
            SequenceCounter::default(),
            None,
            None,
            Instant::from_secs(10),
            &mut rand,
        );
        assert_eq!(tracker.find(dest(1)).unwrap().retries, 1);
    }

    #[test]
    fn expiry_and_ack() {
        let (mut tracker, mut rand) = tracker();
        tracker.send_with_ack(
            dest(1),
            SequenceCounter::default(),
            None,
            None,
            Instant::ZERO,
            &mut rand,
        );

        assert_eq!(tracker.next_expired(Instant::ZERO), None);
        assert_eq!(tracker.next_expired(Instant::from_secs(8)), Some(dest(1)));

        tracker.on_ack(dest(1), SequenceCounter::default());
        assert_eq!(tracker.poll_at(), None);
        assert_eq!(tracker.next_expired(Instant::from_secs(8)), None);
    }

    #[test]
    fn unmatched_ack_is_ignored() {
        let (mut tracker, mut rand) = tracker();
        tracker.send_with_ack(
            dest(1),
            SequenceCounter::new(10),
            None,
            None,
            Instant::ZERO,
            &mut rand,
        );

        // Wrong destination, then wrong sequence.
        tracker.on_ack(dest(2), SequenceCounter::new(10));
        tracker.on_ack(dest(1), SequenceCounter::new(11));
        assert!(tracker.find(dest(1)).is_some());
    }

    #[test]
    fn dropped_counter() {
        let (mut tracker, mut rand) = tracker();
        tracker.send_with_ack(
            dest(1),
            SequenceCounter::default(),
            None,
            None,
            Instant::ZERO,
            &mut rand,
        );

        tracker.mark_dropped(dest(1));
        assert_eq!(tracker.dropped(), 1);
        assert!(tracker.find(dest(1)).is_none());

        // Removing an absent entry does not count as a loss.
        tracker.remove(dest(1));
        assert_eq!(tracker.dropped(), 1);
    }
}
