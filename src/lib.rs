//! An implementation of the RPL routing protocol for IPv6 low power and
//! lossy networks (RFC 6550).
//!
//! The crate provides the wire representation of the RPL control messages
//! with their extension headers, and [`RplNode`], the protocol engine of
//! a single node: it joins a DODAG, selects and supervises a preferred
//! parent, advertises reachability with destination advertisements and
//! computes the forwarding decision for data packets.
//!
//! The engine is detached from any particular network stack. It does not
//! allocate, does not keep packet buffers and never transmits on its own:
//! the caller feeds it received control messages and polls it for
//! transmissions of its own.
//!
//! # Driving the node
//!
//! [`RplNode::process`] takes one received control message and may answer
//! with at most one transmission. [`RplNode::poll`] produces timer driven
//! transmissions, one per call, and [`RplNode::poll_at`] tells the caller
//! when `poll` wants to run next. Topology changes are reported through
//! [`RplNode::poll_event`].
//!
//! For the data plane, [`RplNode::originate`] attaches the RPL packet
//! information to packets sourced by the node itself and
//! [`RplNode::forward`] checks and rewrites the headers of transiting
//! packets, returning the next hop for both.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("You must enable at most one of the following features: defmt, log");

use core::fmt;

#[macro_use]
mod macros;

pub mod config;
mod dao;
mod dodag;
mod lollipop;
mod node;
mod of;
mod parents;
mod rand;
mod rank;
mod relations;
mod routes;
pub mod time;
mod trickle;
pub mod wire;

pub use self::dodag::{ModeOfOperation, ParentPolicy, RplConfig, RplRootConfig};
pub use self::lollipop::SequenceCounter;
pub use self::node::{Event, Forward, PacketMeta, PacketRepr, RplNode, Transmit};
pub use self::of::ObjectiveFunction;
pub use self::rank::Rank;
pub use self::trickle::TrickleTimer;

/// Fatal conditions surfaced by the node.
///
/// Everything recoverable is handled inside the engine. An `Err` means
/// the packet that caused it must be dropped by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A destination advertisement arrived from the preferred parent.
    RoutingLoop,
    /// A packet hit a rank inconsistency for the second time.
    InconsistentRank,
    /// A downward packet cannot be routed any further.
    ForwardingFailure,
    /// There is no preferred parent to route upward through.
    NoParent,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RoutingLoop => write!(f, "routing loop"),
            Error::InconsistentRank => write!(f, "rank inconsistency"),
            Error::ForwardingFailure => write!(f, "forwarding failure"),
            Error::NoParent => write!(f, "no preferred parent"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
