//! Compile-time sizing and protocol defaults.
//!
//! The buffer counts bound every fixed-capacity container in the crate, so
//! memory usage is known up front and no allocator is needed.

use crate::time::Duration;

/// Maximum number of neighbors kept across the candidate and backup sets.
pub const RPL_PARENTS_BUFFER_COUNT: usize = 8;

/// Maximum number of target → transit relations a root keeps.
pub const RPL_RELATIONS_BUFFER_COUNT: usize = 16;

/// Maximum number of downward routes in the routing table.
pub const RPL_ROUTES_BUFFER_COUNT: usize = 16;

/// Maximum number of destination advertisements awaiting acknowledgment.
pub const RPL_DAOS_BUFFER_COUNT: usize = 8;

/// Maximum number of queued notifications before the oldest is dropped.
pub const RPL_EVENTS_BUFFER_COUNT: usize = 8;

pub(crate) const RPL_DEFAULT_INSTANCE: u8 = 0x1e;

// ------------------------------------
// Constants used for the trickle timer:
// ------------------------------------
/// The standard uses 2^3 ms, Contiki uses 2^12 ms.
pub(crate) const DEFAULT_DIO_INTERVAL_MIN: Duration = Duration::from_millis(1 << 12);
/// This is 20 in the standard, but in Contiki they use:
pub(crate) const DEFAULT_DIO_INTERVAL_DOUBLINGS: u8 = 8;
pub(crate) const DEFAULT_DIO_REDUNDANCY_CONSTANT: usize = 10;
pub(crate) const DEFAULT_TRICKLE_EXPONENT: u32 = 2;

pub(crate) const DEFAULT_MIN_HOP_RANK_INCREASE: u16 = 256;

// ---------------------------------------
// Constants used for the lollipop counter:
// ---------------------------------------
pub(crate) const SEQUENCE_WINDOW: u8 = 16;

// ---------------------------------------------------
// Constants used for destination advertisement (DAO):
// ---------------------------------------------------
pub(crate) const DEFAULT_DAO_ACK_TIMEOUT: Duration = Duration::from_secs(2);
pub(crate) const DEFAULT_DAO_RTX_THRESH: u8 = 3;
/// Lifetime of downward routes and relations learned from a DAO.
pub(crate) const DEFAULT_ROUTE_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Lifetime of routes installed while relaying a source routing header.
pub(crate) const DEFAULT_TRANSIENT_ROUTE_LIFETIME: Duration = Duration::from_secs(60);

// ----------------------------------------
// Constants used for solicitation (DIS):
// ----------------------------------------
pub(crate) const DEFAULT_DIS_INTERVAL: Duration = Duration::from_secs(60);

// -----------------------------------
// Constants used for leaving a DODAG:
// -----------------------------------
pub(crate) const DEFAULT_DETACH_COOLDOWN: Duration = Duration::from_secs(10);
