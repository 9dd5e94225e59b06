//! Objective function: how a node computes its own rank and chooses its
//! preferred parent from the candidate set.

use crate::parents::Parent;
use crate::rank::Rank;

/// The metric driving rank computation and parent selection.
///
/// Only the hop count metric is computed. `Etx` and `Energy` are accepted by
/// construction so a configuration can name them, but they fall back to the
/// hop count computation until the engine collects link statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ObjectiveFunction {
    #[default]
    HopCount,
    Etx,
    Energy,
}

impl ObjectiveFunction {
    /// Return the rank a node advertises when routing through the given
    /// parent.
    pub(crate) fn rank(&self, parent_rank: Rank) -> Rank {
        debug_assert!(!parent_rank.is_infinite());

        match self {
            ObjectiveFunction::HopCount => Rank::new(parent_rank.raw_value().saturating_add(1)),
            // Stubs, see the type documentation.
            ObjectiveFunction::Etx | ObjectiveFunction::Energy => {
                Rank::new(parent_rank.raw_value().saturating_add(1))
            }
        }
    }

    /// Select the preferred parent from the given neighbors.
    ///
    /// The neighbor with the lowest advertised rank wins. When a current
    /// preferred parent is given, a different neighbor takes over only if it
    /// improves on the current rank by at least `min_hop_rank_increase`,
    /// which keeps the topology from oscillating between parents of nearly
    /// equal quality.
    pub(crate) fn preferred_parent<'p>(
        &self,
        parents: impl Iterator<Item = &'p Parent>,
        current: Option<&'p Parent>,
        min_hop_rank_increase: u16,
    ) -> Option<&'p Parent> {
        let best = match self {
            ObjectiveFunction::HopCount | ObjectiveFunction::Etx | ObjectiveFunction::Energy => {
                parents.min_by_key(|p| p.rank())?
            }
        };

        match current {
            Some(current)
                if current.address() != best.address()
                    && current.rank().raw_value().saturating_sub(best.rank().raw_value())
                        < min_hop_rank_increase =>
            {
                Some(current)
            }
            _ => Some(best),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MIN_HOP_RANK_INCREASE;
    use crate::lollipop::SequenceCounter;
    use crate::parents::ParentSet;
    use crate::time::Instant;
    use crate::wire::{Address, Dio};

    fn parent(i: u16, rank: u16) -> Parent {
        let dio = Dio {
            rpl_instance_id: 0x1e,
            version_number: SequenceCounter::default(),
            rank,
            storing_mode: false,
            dtsn: SequenceCounter::default(),
            dodag_id: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 1),
            node_id: i as u64,
        };
        Parent::new(Address::new(0xfe80, 0, 0, 0, 0, 0, 0, i), dio, Instant::ZERO)
    }

    #[test]
    fn hop_count_rank() {
        let of = ObjectiveFunction::HopCount;
        assert_eq!(of.rank(Rank::ROOT), Rank::new(2));
        assert_eq!(of.rank(Rank::new(2)), Rank::new(3));
    }

    #[test]
    fn stubbed_metrics_compute_hop_count() {
        assert_eq!(ObjectiveFunction::Etx.rank(Rank::ROOT), Rank::new(2));
        assert_eq!(ObjectiveFunction::Energy.rank(Rank::ROOT), Rank::new(2));
    }

    #[test]
    fn lowest_rank_wins() {
        let of = ObjectiveFunction::HopCount;

        let mut set = ParentSet::default();
        set.add(parent(1, 4));
        set.add(parent(2, 2));
        set.add(parent(3, 3));

        let best = of
            .preferred_parent(
                set.candidates(Rank::new(5)),
                None,
                DEFAULT_MIN_HOP_RANK_INCREASE,
            )
            .unwrap();
        assert_eq!(best.address(), Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 2));
    }

    #[test]
    fn empty_set_selects_nothing() {
        let of = ObjectiveFunction::HopCount;
        let set = ParentSet::default();
        assert!(of
            .preferred_parent(set.candidates(Rank::new(5)), None, 256)
            .is_none());
    }

    #[test]
    fn small_improvement_keeps_current_parent() {
        let of = ObjectiveFunction::HopCount;

        let mut set = ParentSet::default();
        set.add(parent(1, 2));
        set.add(parent(2, 1));

        let current = set.find(Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 1));

        // One rank better is below the hysteresis threshold.
        let kept = of
            .preferred_parent(set.candidates(Rank::new(5)), current, 256)
            .unwrap();
        assert_eq!(kept.address(), Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 1));

        // With the threshold lowered the better parent takes over.
        let switched = of
            .preferred_parent(set.candidates(Rank::new(5)), current, 1)
            .unwrap();
        assert_eq!(
            switched.address(),
            Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 2)
        );
    }
}
