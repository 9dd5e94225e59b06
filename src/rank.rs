//! Implementation of the Rank in RPL.
//!
//! The Rank is a scalar that grows with the distance from the DODAG root.
//! Under the hop-count objective function the Rank of a node is the Rank of
//! its preferred parent plus one, the root advertises Rank 1, and an
//! unattached node has the infinite Rank.
//!
//! Meaning of the comparison:
//! - **Rank M is less than Rank N**: node M is closer to the DODAG root than
//!   node N. Node M may safely be a DODAG parent for node N.
//! - **Ranks are equal**: both nodes are at a similar position. Routing
//!   through a node with equal Rank may cause a routing loop.
//! - **Rank M is greater than Rank N**: node M is farther from the DODAG
//!   root. If node N selects node M as a DODAG parent, there is a risk of
//!   creating a loop.

/// The relative position of a node within a DODAG Version with regard to its
/// neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rank(pub u16);

impl core::fmt::Display for Rank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_infinite() {
            write!(f, "Rank(INFINITE)")
        } else {
            write!(f, "Rank({})", self.0)
        }
    }
}

impl Rank {
    /// The Rank advertised by a node that is not a member of any DODAG.
    pub const INFINITE: Self = Rank(0xffff);

    /// The smallest Rank possible, advertised by the DODAG root.
    pub const ROOT: Self = Rank(1);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Return the raw Rank value.
    pub const fn raw_value(&self) -> u16 {
        self.0
    }

    pub const fn is_infinite(&self) -> bool {
        self.0 == Self::INFINITE.0
    }
}

impl From<u16> for Rank {
    fn from(value: u16) -> Self {
        Rank(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison() {
        assert!(Rank::ROOT < Rank::new(2));
        assert!(Rank::new(2) < Rank::new(3));
        assert!(Rank::ROOT < Rank::INFINITE);
        assert_eq!(Rank::new(2), Rank::new(2));
    }

    #[test]
    fn infinite() {
        assert!(Rank::INFINITE.is_infinite());
        assert!(!Rank::ROOT.is_infinite());
        assert_eq!(Rank::new(0xffff), Rank::INFINITE);
    }
}
