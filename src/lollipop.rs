//! Sequence counters from [RFC 6550 § 7.2]. The value space is split in two:
//! values of 128 and above form a linear region used to bootstrap the counter
//! after a restart, values below 128 form a circular region of size 128.
//! Two values further apart than the sequence window are not comparable.
//!
//! Used for the DODAG version number, the DTSN and the DAO sequence number.
//!
//! [RFC 6550 § 7.2]: https://datatracker.ietf.org/doc/html/rfc6550#section-7.2

use crate::config::SEQUENCE_WINDOW;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceCounter(u8);

impl Default for SequenceCounter {
    fn default() -> Self {
        // RFC 6550 7.2 recommends 256 - SEQUENCE_WINDOW as the initialization
        // value of the counter.
        Self(240)
    }
}

impl SequenceCounter {
    /// Create a sequence counter with a specific value.
    ///
    /// Use `Self::default()` for the RFC 6550 7.2 initialization value.
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Return the value of the sequence counter.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Increment the sequence counter.
    ///
    /// The counter stays inside its current region: incrementing past 255 in
    /// the linear region or past 127 in the circular region wraps to zero.
    pub fn increment(&mut self) {
        let max = if self.0 >= 128 { 255 } else { 127 };

        self.0 = match self.0.checked_add(1) {
            Some(value) if value <= max => value,
            _ => 0,
        };
    }
}

impl PartialEq for SequenceCounter {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.partial_cmp(other), Some(core::cmp::Ordering::Equal))
    }
}

impl PartialOrd for SequenceCounter {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        use core::cmp::Ordering;

        let a = self.0 as usize;
        let b = other.0 as usize;
        let window = SEQUENCE_WINDOW as usize;

        match (a < 128, b < 128) {
            (true, true) | (false, false) => {
                if a.abs_diff(b) <= window {
                    // RFC 1982 comparison inside one region.
                    a.partial_cmp(&b)
                } else {
                    None
                }
            }
            // One counter restarted recently, the other did not follow yet.
            (false, true) => {
                if 256 + b - a <= window {
                    Some(Ordering::Less)
                } else {
                    Some(Ordering::Greater)
                }
            }
            (true, false) => {
                if 256 + a - b <= window {
                    Some(Ordering::Greater)
                } else {
                    Some(Ordering::Less)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cmp::Ordering;

    #[test]
    fn increment() {
        let mut seq = SequenceCounter::new(254);
        seq.increment();
        assert_eq!(seq.value(), 255);
        seq.increment();
        assert_eq!(seq.value(), 0);

        let mut seq = SequenceCounter::new(126);
        seq.increment();
        assert_eq!(seq.value(), 127);
        seq.increment();
        assert_eq!(seq.value(), 0);
    }

    #[test]
    fn equality() {
        assert!(SequenceCounter::new(240) == SequenceCounter::new(240));
        assert!(SequenceCounter::new(240) != SequenceCounter::new(1));
        assert!(SequenceCounter::new(1) != SequenceCounter::new(240));
        assert!(SequenceCounter::new(100) != SequenceCounter::new(60));
        assert!(SequenceCounter::new(60) == SequenceCounter::new(60));
    }

    #[test]
    fn comparison() {
        // Restart region vs circular region.
        assert_eq!(
            SequenceCounter::new(252).partial_cmp(&SequenceCounter::new(3)),
            Some(Ordering::Less)
        );
        assert_eq!(
            SequenceCounter::new(3).partial_cmp(&SequenceCounter::new(252)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            SequenceCounter::new(200).partial_cmp(&SequenceCounter::new(3)),
            Some(Ordering::Greater)
        );

        // Same region, inside the window.
        assert_eq!(
            SequenceCounter::new(250).partial_cmp(&SequenceCounter::new(245)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            SequenceCounter::new(60).partial_cmp(&SequenceCounter::new(61)),
            Some(Ordering::Less)
        );
        assert_eq!(
            SequenceCounter::new(60).partial_cmp(&SequenceCounter::new(60)),
            Some(Ordering::Equal)
        );

        // Same region, too far apart.
        assert_eq!(
            SequenceCounter::new(10).partial_cmp(&SequenceCounter::new(100)),
            None
        );
        assert_eq!(
            SequenceCounter::new(130).partial_cmp(&SequenceCounter::new(250)),
            None
        );
    }
}
