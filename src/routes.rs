//! The downward routing table of a storing node, plus the single default
//! route every attached node keeps toward its preferred parent. Lookups are
//! host-exact with a default-route fallback; every entry is tagged with the
//! DODAG it was learned from so a detach can purge exactly its own state.

use heapless::Vec;

use crate::config::RPL_ROUTES_BUFFER_COUNT;
use crate::lollipop::SequenceCounter;
use crate::time::Instant;
use crate::wire::Address;

/// Provenance and lifetime of a route.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RouteMeta {
    pub(crate) dodag_id: Address,
    pub(crate) instance_id: u8,
    pub(crate) sequence: SequenceCounter,
    /// `None` for routes without a lifetime, such as the default route.
    pub(crate) expires_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Route {
    pub(crate) destination: Address,
    pub(crate) next_hop: Address,
    pub(crate) meta: RouteMeta,
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} via {} (seq {})",
            self.destination,
            self.next_hop,
            self.meta.sequence.value()
        )?;
        if let Some(expires_at) = self.meta.expires_at {
            write!(f, " (expires at {expires_at})")?;
        }
        Ok(())
    }
}

impl Route {
    fn expired(&self, now: Instant) -> bool {
        matches!(self.meta.expires_at, Some(expires_at) if expires_at <= now)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Routes {
    routes: Vec<Route, { RPL_ROUTES_BUFFER_COUNT }>,
    default: Option<Route>,
}

impl Routes {
    /// Add a host route, updating in place when the destination is already
    /// known. Returns whether the destination was previously unknown.
    pub(crate) fn add_route(
        &mut self,
        destination: Address,
        next_hop: Address,
        meta: RouteMeta,
    ) -> bool {
        if let Some(route) = self
            .routes
            .iter_mut()
            .find(|r| r.destination == destination)
        {
            route.next_hop = next_hop;
            route.meta = meta;
            return false;
        }

        let route = Route {
            destination,
            next_hop,
            meta,
        };

        if self.routes.push(route).is_err() {
            net_trace!("unable to add route to {}, table is full", destination);
            return false;
        }

        true
    }

    /// Install the default route, replacing any previous one.
    pub(crate) fn set_default_route(&mut self, next_hop: Address, meta: RouteMeta) {
        self.default = Some(Route {
            destination: Address::UNSPECIFIED,
            next_hop,
            meta,
        });
    }

    /// Remove the default route; idempotent.
    pub(crate) fn remove_default_route(&mut self) {
        self.default = None;
    }

    /// Look up the next hop for a destination, host routes only.
    pub(crate) fn lookup_host(&self, destination: Address, now: Instant) -> Option<Address> {
        self.routes
            .iter()
            .find(|r| r.destination == destination && !r.expired(now))
            .map(|r| r.next_hop)
    }

    /// Look up the next hop for a destination, falling back to the default
    /// route.
    pub(crate) fn lookup(&self, destination: Address, now: Instant) -> Option<Address> {
        self.lookup_host(destination, now).or_else(|| {
            self.default
                .as_ref()
                .filter(|r| !r.expired(now))
                .map(|r| r.next_hop)
        })
    }

    /// Drop every route learned from the given DODAG, the default route
    /// included.
    pub(crate) fn purge(&mut self, dodag_id: Address, instance_id: u8) {
        self.routes
            .retain(|r| r.meta.dodag_id != dodag_id || r.meta.instance_id != instance_id);

        if let Some(default) = &self.default {
            if default.meta.dodag_id == dodag_id && default.meta.instance_id == instance_id {
                self.default = None;
            }
        }
    }

    /// Purge expired routes.
    ///
    /// Returns `true` when a route was actually removed.
    pub(crate) fn flush(&mut self, now: Instant) -> bool {
        let len = self.routes.len();
        self.routes.retain(|r| {
            if r.expired(now) {
                net_trace!("removing route {} (expired)", r);
                false
            } else {
                true
            }
        });

        let mut removed = self.routes.len() != len;

        if matches!(&self.default, Some(default) if default.expired(now)) {
            self.default = None;
            removed = true;
        }

        removed
    }
}
