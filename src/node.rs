//! The RPL node engine.
//!
//! [`RplNode`] holds the complete protocol state of one node and is driven
//! from the outside: feed it received control messages with
//! [`process`][RplNode::process], ask it when it wants to run with
//! [`poll_at`][RplNode::poll_at] and let it produce transmissions with
//! [`poll`][RplNode::poll]. Data packets do not pass through the engine,
//! only their forwarding decision does, via
//! [`originate`][RplNode::originate] and [`forward`][RplNode::forward].
//!
//! The engine never transmits by itself and produces at most one
//! transmission per call, which keeps it free of any buffer management.

use crate::config::*;
use crate::dao::DaoTracker;
use crate::dodag::{DaoAckRequest, Dodag, ModeOfOperation, ParentPolicy, RplConfig};
use crate::lollipop::SequenceCounter;
use crate::of::ObjectiveFunction;
use crate::parents::Parent;
use crate::rand::Rand;
use crate::rank::Rank;
use crate::routes::{RouteMeta, Routes};
use crate::time::{Duration, Instant};
use crate::trickle::TrickleTimer;
use crate::wire::{
    Address, AddressExt, Dao, DaoAck, Dio, Dis, PacketInfo, Repr, SourceRoutingRepr,
    LINK_LOCAL_ALL_RPL_NODES,
};
use crate::Error;

use heapless::Deque;

/// Topology changes, consumed with [`RplNode::poll_event`].
///
/// Events are informational. Missing one does not change the behavior of
/// the node, so the queue drops the oldest event when it overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The node became part of a DODAG.
    JoinedDodag { dodag_id: Address },
    /// The advertised rank of the node changed.
    RankChanged { rank: Rank },
    /// Another node became the preferred parent.
    ParentChanged { parent: Address },
    /// The preferred parent expired or advertised an infinite rank.
    ParentUnreachable { parent: Address },
    /// A destination below us advertised itself for the first time.
    ChildJoined { child: Address },
}

/// Addressing of a received control message.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketMeta {
    pub src_addr: Address,
    pub dst_addr: Address,
}

/// A control message together with its extension headers.
///
/// Each part is encoded separately on the wire. The packet info and source
/// routing segments are only present when the message needs them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketRepr {
    pub control: Repr,
    pub info: Option<PacketInfo>,
    pub source_route: Option<SourceRoutingRepr>,
}

impl PacketRepr {
    pub fn new(control: Repr) -> Self {
        Self {
            control,
            info: None,
            source_route: None,
        }
    }
}

/// A transmission requested by the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transmit {
    pub dst_addr: Address,
    pub packet: PacketRepr,
}

/// The forwarding decision for one data packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Forward {
    pub next_hop: Address,
    /// The rewritten packet info header, carrying our own rank.
    pub info: PacketInfo,
    /// The remaining source routing header, when relaying one.
    pub source_route: Option<SourceRoutingRepr>,
}

/// An RPL node.
#[derive(Debug)]
pub struct RplNode {
    address: Address,
    node_id: u64,
    is_root: bool,
    mode_of_operation: ModeOfOperation,
    objective_function: ObjectiveFunction,
    min_hop_rank_increase: u16,
    parent_policy: ParentPolicy,
    allow_dodag_switch: bool,
    dao_enabled: bool,
    dao_rtx_thresh: u8,
    instance_id: u8,
    dis_interval: Duration,
    detach_cooldown: Duration,
    poison_on_detach: bool,

    dodag: Option<Dodag>,
    dio_timer: TrickleTimer,
    dis_expiration: Instant,
    detached_until: Option<Instant>,
    routes: Routes,
    dao_tracker: DaoTracker,
    events: Deque<Event, { RPL_EVENTS_BUFFER_COUNT }>,
    rand: Rand,
}

impl RplNode {
    /// Create a node with the given configuration.
    ///
    /// A root starts advertising its DODAG right away, every other node
    /// starts soliciting one.
    pub fn new(
        config: RplConfig,
        address: Address,
        node_id: u64,
        random_seed: u64,
        now: Instant,
    ) -> Self {
        let mut rand = Rand::new(random_seed);
        let mut dio_timer = config.dio_timer;
        let is_root = config.root.is_some();

        let dodag = if let Some(root) = config.root {
            dio_timer.start(now, &mut rand, true);
            Some(Dodag::root(root.dodag_id, config.instance_id))
        } else {
            None
        };

        Self {
            address,
            node_id,
            is_root,
            mode_of_operation: config.mode_of_operation,
            objective_function: config.objective_function,
            min_hop_rank_increase: config.min_hop_rank_increase,
            parent_policy: config.parent_policy,
            allow_dodag_switch: config.allow_dodag_switch,
            dao_enabled: config.dao_enabled,
            dao_rtx_thresh: config.dao_rtx_thresh,
            instance_id: config.instance_id,
            dis_interval: config.dis_interval,
            detach_cooldown: config.detach_cooldown,
            poison_on_detach: config.poison_on_detach,
            dodag,
            dio_timer,
            dis_expiration: now,
            detached_until: None,
            routes: Routes::default(),
            dao_tracker: DaoTracker::new(config.dao_ack_timeout),
            events: Deque::new(),
            rand,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn mode_of_operation(&self) -> ModeOfOperation {
        self.mode_of_operation
    }

    /// The advertised rank, infinite while not part of a DODAG.
    pub fn rank(&self) -> Rank {
        self.dodag.as_ref().map_or(Rank::INFINITE, |dodag| dodag.rank)
    }

    pub fn dodag_id(&self) -> Option<Address> {
        self.dodag.as_ref().map(|dodag| dodag.id)
    }

    pub fn preferred_parent(&self) -> Option<Address> {
        self.dodag.as_ref().and_then(|dodag| dodag.preferred_parent)
    }

    pub fn is_attached(&self) -> bool {
        self.dodag.is_some()
    }

    /// Whether the node sits out its detach cooldown. Cleared on the first
    /// `poll` or `process` call after the cooldown passed.
    pub fn is_detached(&self) -> bool {
        self.detached_until.is_some()
    }

    /// Destination advertisements given up on after exhausting their
    /// retransmissions.
    pub fn dao_drops(&self) -> usize {
        self.dao_tracker.dropped()
    }

    /// Return one queued topology event.
    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Process a received control message, possibly answering with one
    /// transmission of our own.
    pub fn process(
        &mut self,
        now: Instant,
        meta: PacketMeta,
        repr: Repr,
    ) -> Result<Option<Transmit>, Error> {
        if self.detached(now) {
            net_trace!("detached, dropping {}", repr);
            return Ok(None);
        }

        // Every message heard counts against the trickle redundancy
        // constant, whether we end up liking it or not.
        if self.dodag.is_some() {
            self.dio_timer.hear_message();
        }

        match repr {
            Repr::DodagInformationSolicitation(_) => self.process_dis(now, meta),
            Repr::DodagInformationObject(dio) => self.process_dio(now, meta, &dio),
            Repr::DestinationAdvertisementObject(dao) => self.process_dao(now, meta, &dao),
            Repr::DestinationAdvertisementObjectAck(ack) => self.process_dao_ack(meta, &ack),
        }
    }

    fn process_dis(&mut self, now: Instant, meta: PacketMeta) -> Result<Option<Transmit>, Error> {
        let Some(dodag) = &self.dodag else {
            return Ok(None);
        };

        if meta.dst_addr.x_is_unicast() {
            // Answer directly, the solicitation was just for us.
            net_trace!("unicast DIS from {}, answering with unicast DIO", meta.src_addr);
            let dio = dodag.dodag_information_object(self.node_id, self.mode_of_operation.into());
            Ok(Some(Transmit {
                dst_addr: meta.src_addr,
                packet: PacketRepr::new(dio),
            }))
        } else {
            net_trace!("multicast DIS from {}", meta.src_addr);
            self.dio_timer.reset(now, &mut self.rand);
            Ok(None)
        }
    }

    fn process_dio(
        &mut self,
        now: Instant,
        meta: PacketMeta,
        dio: &Dio,
    ) -> Result<Option<Transmit>, Error> {
        let sender_rank = Rank::new(dio.rank);

        // Check DIO validity
        // ==================
        if dio.rpl_instance_id != self.instance_id {
            net_trace!("dropping DIO for instance {}", dio.rpl_instance_id);
            return Ok(None);
        }

        if dio.storing_mode != bool::from(self.mode_of_operation) {
            net_trace!("dropping DIO with a different mode of operation");
            return Ok(None);
        }

        // The root never changes its rank or parent.
        if self.is_root {
            if let Some(dodag) = &self.dodag {
                if dio.dodag_id != dodag.id {
                    net_trace!("DIO for foreign DODAG {}", dio.dodag_id);
                }
            }
            return Ok(None);
        }

        // Join the first DODAG we hear of
        // ===============================
        let Some(dodag) = &mut self.dodag else {
            if sender_rank.is_infinite() {
                net_trace!("ignoring DIO with infinite rank from {}", meta.src_addr);
                return Ok(None);
            }

            net_trace!(
                "joining DODAG {} advertised by {} (rank {})",
                dio.dodag_id,
                meta.src_addr,
                sender_rank
            );

            let mut dodag = Dodag::from_dio(dio);
            dodag.parent_set.add(Parent::new(meta.src_addr, *dio, now));
            self.dodag = Some(dodag);
            self.dio_timer.reset(now, &mut self.rand);
            Self::push_event(
                &mut self.events,
                Event::JoinedDodag {
                    dodag_id: dio.dodag_id,
                },
            );

            return Ok(self.reevaluate_parent(now));
        };

        // Check the advertised DODAG against ours
        // =======================================
        if dio.dodag_id != dodag.id {
            if !self.allow_dodag_switch {
                net_trace!("dropping DIO for foreign DODAG {}", dio.dodag_id);
                return Ok(None);
            }

            // Consider the other DODAG only when it makes us better off.
            if sender_rank.is_infinite()
                || self.objective_function.rank(sender_rank) >= dodag.rank
            {
                return Ok(None);
            }

            net_trace!("considering a switch to DODAG {}", dio.dodag_id);
        } else {
            if dio.version_number < dodag.version_number {
                net_trace!("dropping DIO with outdated version number");
                return Ok(None);
            }
            if dodag.version_number < dio.version_number {
                dodag.version_number = dio.version_number;
            }
        }

        // A poisoning advertisement only matters when it comes from the
        // node we route through.
        if sender_rank.is_infinite() {
            if dodag.preferred_parent == Some(meta.src_addr) {
                net_trace!("preferred parent {} advertised infinite rank", meta.src_addr);
                dodag.parent_set.remove(meta.src_addr);
                dodag.preferred_parent = None;
                Self::push_event(
                    &mut self.events,
                    Event::ParentUnreachable {
                        parent: meta.src_addr,
                    },
                );
                return Ok(self.reevaluate_parent(now));
            }

            net_trace!("ignoring DIO with infinite rank from {}", meta.src_addr);
            return Ok(None);
        }

        // A DTSN increase asks for fresh destination advertisements.
        let mut dao_refresh = false;
        if dodag.preferred_parent == Some(meta.src_addr) {
            if let Some(parent) = dodag.parent_set.find(meta.src_addr) {
                if parent.dio().dtsn < dio.dtsn {
                    net_trace!("DTSN of {} increased, scheduling DAO", meta.src_addr);
                    dao_refresh = self.dao_enabled;
                    if matches!(self.mode_of_operation, ModeOfOperation::StoringMode) {
                        // Propagate the request to our own children.
                        dodag.dtsn.increment();
                    }
                }
            }
        }

        // Admit the neighbor into the parent set
        // ======================================
        if sender_rank <= dodag.rank || dodag.preferred_parent == Some(meta.src_addr) {
            dodag.parent_set.add(Parent::new(meta.src_addr, *dio, now));
        } else {
            net_trace!(
                "{} (rank {}) does not qualify as a parent",
                meta.src_addr,
                sender_rank
            );
        }

        let transmit = self.reevaluate_parent(now);
        if transmit.is_some() {
            return Ok(transmit);
        }

        if dao_refresh {
            return Ok(self.refresh_dao(now));
        }

        Ok(None)
    }

    fn process_dao(
        &mut self,
        now: Instant,
        meta: PacketMeta,
        dao: &Dao,
    ) -> Result<Option<Transmit>, Error> {
        let Some(dodag) = &mut self.dodag else {
            return Ok(None);
        };

        // Check DAO validity
        // ==================
        if dao.rpl_instance_id != dodag.instance_id || dao.dodag_id != dodag.id {
            net_trace!("dropping DAO for a different DODAG");
            return Ok(None);
        }

        // A destination advertisement from the node we route upward
        // through means the topology folded into a loop.
        if dodag.preferred_parent == Some(meta.src_addr) {
            net_debug!("DAO from our preferred parent {}", meta.src_addr);
            return Err(Error::RoutingLoop);
        }

        if !self.is_root && dodag.preferred_parent.is_none() {
            net_trace!("no preferred parent, dropping DAO from {}", meta.src_addr);
            return Ok(None);
        }

        net_trace!(
            "DAO from {} advertising {}",
            meta.src_addr,
            dao.reachable_dest
        );

        if dao.ack_required && meta.dst_addr == self.address {
            dodag.schedule_dao_ack(DaoAckRequest {
                to: meta.src_addr,
                sequence: dao.sequence,
                destination: dao.reachable_dest,
            });
        }

        // Record reachability
        // ===================
        if matches!(self.mode_of_operation, ModeOfOperation::StoringMode) {
            let new = self.routes.add_route(
                dao.reachable_dest,
                meta.src_addr,
                RouteMeta {
                    dodag_id: dodag.id,
                    instance_id: dodag.instance_id,
                    sequence: dao.sequence,
                    expires_at: Some(now + DEFAULT_ROUTE_LIFETIME),
                },
            );
            if new {
                Self::push_event(
                    &mut self.events,
                    Event::ChildJoined {
                        child: dao.reachable_dest,
                    },
                );
            }
        } else if self.is_root {
            if let (Some(target), Some(transit)) = (dao.target, dao.transit) {
                if dodag
                    .relations
                    .add_relation(target, transit, dao.sequence, now, DEFAULT_ROUTE_LIFETIME)
                {
                    Self::push_event(&mut self.events, Event::ChildJoined { child: target });
                }
            } else {
                net_trace!(
                    "DAO from {} without target and transit options",
                    meta.src_addr
                );
            }
        }

        if self.is_root {
            return Ok(None);
        }

        // Propagate upward
        // ================
        let Some(parent) = dodag.preferred_parent else {
            return Ok(None);
        };

        let (repr, sequence) = dodag.destination_advertisement_object(
            self.address,
            self.node_id,
            dao.reachable_dest,
            dao.target,
            dao.transit,
            true,
        );
        self.dao_tracker.send_with_ack(
            dao.reachable_dest,
            sequence,
            dao.target,
            dao.transit,
            now,
            &mut self.rand,
        );

        net_trace!("advertising {} to {}", dao.reachable_dest, parent);

        let info = self.packet_info(false);
        Ok(Some(Transmit {
            dst_addr: parent,
            packet: PacketRepr {
                control: repr,
                info: Some(info),
                source_route: None,
            },
        }))
    }

    fn process_dao_ack(
        &mut self,
        meta: PacketMeta,
        ack: &DaoAck,
    ) -> Result<Option<Transmit>, Error> {
        let Some(dodag) = &self.dodag else {
            return Ok(None);
        };

        if ack.rpl_instance_id != dodag.instance_id || ack.dodag_id != dodag.id {
            net_trace!("dropping DAO-ACK for a different DODAG");
            return Ok(None);
        }

        net_trace!(
            "DAO-ACK from {} for {}",
            meta.src_addr,
            ack.reachable_dest
        );
        self.dao_tracker.on_ack(ack.reachable_dest, ack.sequence);
        Ok(None)
    }

    /// Emit queued transmissions and drive the timers.
    pub fn poll(&mut self, now: Instant) -> Option<Transmit> {
        if self.detached(now) {
            return None;
        }

        // Solicit a DODAG while unattached
        // ================================
        if self.dodag.is_none() {
            if now >= self.dis_expiration {
                self.dis_expiration = now + self.dis_interval;
                net_trace!("soliciting DODAG information");
                return Some(Transmit {
                    dst_addr: LINK_LOCAL_ALL_RPL_NODES,
                    packet: PacketRepr::new(Repr::DodagInformationSolicitation(Dis {
                        node_id: self.node_id,
                    })),
                });
            }
            return None;
        }

        // Purge stale downward state
        // ==========================
        let mut lost = self.routes.flush(now);
        if let Some(dodag) = &mut self.dodag {
            lost |= dodag.relations.flush(now);
            if lost && self.is_root {
                // Ask the children to advertise their reachability again.
                dodag.dtsn.increment();
            }
        }

        // Check that the preferred parent is still alive
        // ==============================================
        let liveness_timeout = self.dio_timer.max_expiration() * 2;
        if let Some(dodag) = &mut self.dodag {
            if let Some(parent_addr) = dodag.preferred_parent {
                let expired = dodag
                    .parent_set
                    .find(parent_addr)
                    .map_or(true, |parent| parent.last_heard() + liveness_timeout <= now);

                if expired {
                    net_trace!("preferred parent {} expired", parent_addr);
                    dodag.parent_set.remove(parent_addr);
                    dodag.preferred_parent = None;
                    Self::push_event(
                        &mut self.events,
                        Event::ParentUnreachable {
                            parent: parent_addr,
                        },
                    );

                    if let Some(transmit) = self.reevaluate_parent(now) {
                        return Some(transmit);
                    }
                    if self.dodag.is_none() {
                        return None;
                    }
                }
            }
        }

        // Retransmit unacknowledged destination advertisements
        // ====================================================
        while let Some(destination) = self.dao_tracker.next_expired(now) {
            let Some(parent) = self.preferred_parent() else {
                net_trace!("no parent to retransmit DAO for {} to", destination);
                self.dao_tracker.remove(destination);
                continue;
            };

            let Some(retries) = self.dao_tracker.increment_retries(destination) else {
                continue;
            };

            if retries > self.dao_rtx_thresh {
                net_debug!("giving up on DAO for {}", destination);
                self.dao_tracker.mark_dropped(destination);
                continue;
            }

            let Some(entry) = self.dao_tracker.find(destination).copied() else {
                continue;
            };
            let Some(dodag) = &self.dodag else {
                break;
            };

            let repr = Repr::DestinationAdvertisementObject(Dao {
                rpl_instance_id: dodag.instance_id,
                ack_required: entry.ack_required,
                sequence: entry.sequence,
                dodag_id: dodag.id,
                src_address: self.address,
                reachable_dest: destination,
                node_id: self.node_id,
                target: entry.target,
                transit: entry.transit,
            });

            self.dao_tracker.send_with_ack(
                destination,
                entry.sequence,
                entry.target,
                entry.transit,
                now,
                &mut self.rand,
            );

            net_trace!("retransmitting DAO for {} (retry {})", destination, retries);

            let info = self.packet_info(false);
            return Some(Transmit {
                dst_addr: parent,
                packet: PacketRepr {
                    control: repr,
                    info: Some(info),
                    source_route: None,
                },
            });
        }

        // Answer destination advertisements
        // =================================
        if let Some(dodag) = &mut self.dodag {
            if !dodag.dao_acks.is_empty() {
                let request = dodag.dao_acks.remove(0);
                let repr =
                    dodag.destination_advertisement_object_ack(self.address, self.node_id, &request);
                net_trace!("acknowledging DAO from {}", request.to);
                return Some(Transmit {
                    dst_addr: request.to,
                    packet: PacketRepr::new(repr),
                });
            }
        }

        // Advertise the DODAG
        // ===================
        if self.dio_timer.poll(now, &mut self.rand) {
            if let Some(dodag) = &self.dodag {
                net_trace!("advertising DODAG {} (rank {})", dodag.id, dodag.rank);
                let dio = dodag.dodag_information_object(self.node_id, self.mode_of_operation.into());
                return Some(Transmit {
                    dst_addr: LINK_LOCAL_ALL_RPL_NODES,
                    packet: PacketRepr::new(dio),
                });
            }
        }

        None
    }

    /// The next instant at which `poll` should be called.
    pub fn poll_at(&self) -> Option<Instant> {
        if let Some(until) = self.detached_until {
            return Some(until);
        }

        let Some(dodag) = &self.dodag else {
            return Some(self.dis_expiration);
        };

        if !dodag.dao_acks.is_empty() {
            return Some(Instant::ZERO);
        }

        let mut deadline = self.dio_timer.poll_at();
        if let Some(dao) = self.dao_tracker.poll_at() {
            deadline = Some(deadline.map_or(dao, |d| d.min(dao)));
        }
        deadline
    }

    /// Compute the forwarding decision for a packet we originate.
    pub fn originate(&mut self, now: Instant, destination: Address) -> Result<Forward, Error> {
        let (next_hop, down, source_route) = self.resolve(now, destination)?;

        Ok(Forward {
            next_hop,
            info: self.packet_info(down),
            source_route,
        })
    }

    /// Compute the forwarding decision for a transiting packet, checking
    /// its packet info header for rank consistency and rewriting it with
    /// our own rank.
    pub fn forward(
        &mut self,
        now: Instant,
        destination: Address,
        info: Option<PacketInfo>,
        source_route: Option<SourceRoutingRepr>,
    ) -> Result<Forward, Error> {
        let own_rank = match &self.dodag {
            Some(dodag) => dodag.rank,
            None => return Err(Error::NoParent),
        };

        // Relay a source routed packet
        // ============================
        let (next_hop, down, outgoing_route) = if let Some(mut route) = source_route {
            if route.addresses.first() == Some(&self.address) {
                route.addresses.remove(0);
            }

            let Some(next_hop) = route.addresses.first().copied() else {
                net_trace!("exhausted source routing header for {}", destination);
                return Err(Error::ForwardingFailure);
            };

            // Answers to the destination will come through this segment.
            self.install_transient_route(next_hop, now);
            (next_hop, true, Some(route))
        } else {
            self.resolve(now, destination)?
        };

        // A downward packet we cannot route further cannot be repaired
        // from here.
        if matches!(self.mode_of_operation, ModeOfOperation::StoringMode)
            && info.map_or(false, |info| info.down)
            && !down
        {
            net_trace!("no downward route towards {}, dropping", destination);
            return Err(Error::ForwardingFailure);
        }

        // Check rank consistency
        // ======================
        let mut rank_error = false;
        if let Some(incoming) = info {
            let inconsistent = (down && incoming.sender_rank >= own_rank.raw_value())
                || (!down && incoming.sender_rank <= own_rank.raw_value());

            if inconsistent {
                if incoming.rank_error {
                    net_trace!("rank inconsistency on an already flagged packet, dropping");
                    self.dio_timer.reset(now, &mut self.rand);
                    return Err(Error::InconsistentRank);
                }
                net_trace!("rank inconsistency towards {}", destination);
            }
            rank_error = incoming.rank_error || inconsistent;
        }

        Ok(Forward {
            next_hop,
            info: PacketInfo {
                down,
                rank_error,
                forwarding_error: info.map_or(false, |info| info.forwarding_error),
                instance_id: self.instance_id,
                sender_rank: own_rank.raw_value(),
            },
            source_route: outgoing_route,
        })
    }

    /// Resolve the next hop for a destination: downward when we know the
    /// destination, upward through the preferred parent otherwise.
    fn resolve(
        &mut self,
        now: Instant,
        destination: Address,
    ) -> Result<(Address, bool, Option<SourceRoutingRepr>), Error> {
        let Some(dodag) = &self.dodag else {
            return Err(Error::NoParent);
        };

        if self.is_root && matches!(self.mode_of_operation, ModeOfOperation::NonStoringMode) {
            let Some(addresses) = dodag.relations.source_route(destination, self.address) else {
                net_trace!("no source route towards {}", destination);
                return Err(Error::NoParent);
            };

            let Some(next_hop) = addresses.first().copied() else {
                return Ok((destination, true, None));
            };

            return Ok((next_hop, true, Some(SourceRoutingRepr { addresses })));
        }

        if let Some(next_hop) = self.routes.lookup_host(destination, now) {
            return Ok((next_hop, true, None));
        }

        // The default route tracks the preferred parent.
        match self.routes.lookup(destination, now) {
            Some(next_hop) => Ok((next_hop, false, None)),
            None => {
                net_trace!("no route towards {}", destination);
                Err(Error::NoParent)
            }
        }
    }

    fn install_transient_route(&mut self, next_hop: Address, now: Instant) {
        let Some(dodag) = &self.dodag else { return };
        self.routes.add_route(
            next_hop,
            next_hop,
            RouteMeta {
                dodag_id: dodag.id,
                instance_id: dodag.instance_id,
                sequence: SequenceCounter::default(),
                expires_at: Some(now + DEFAULT_TRANSIENT_ROUTE_LIFETIME),
            },
        );
    }

    /// Select the best parent from the parent set, honoring the parent
    /// switch hysteresis of the objective function.
    fn select_parent(&self) -> Option<Parent> {
        let dodag = self.dodag.as_ref()?;
        let current = dodag
            .preferred_parent
            .and_then(|addr| dodag.parent_set.find(addr));

        let mut selected = self.objective_function.preferred_parent(
            dodag.parent_set.candidates(dodag.rank),
            current,
            self.min_hop_rank_increase,
        );

        if selected.is_none() && matches!(self.parent_policy, ParentPolicy::PromoteBackup) {
            selected = self.objective_function.preferred_parent(
                dodag.parent_set.backups(dodag.rank),
                current,
                self.min_hop_rank_increase,
            );
        }

        selected.copied()
    }

    /// Re-evaluate the preferred parent after the parent set changed.
    ///
    /// Adopting a new parent clears the state built through the old one,
    /// installs the default route, resets the trickle timer and advertises
    /// our reachability through the new parent. Losing the last parent
    /// detaches us from the DODAG.
    fn reevaluate_parent(&mut self, now: Instant) -> Option<Transmit> {
        self.dodag.as_ref()?;

        let Some(parent) = self.select_parent() else {
            let set_empty = self
                .dodag
                .as_ref()
                .map_or(true, |dodag| dodag.parent_set.is_empty());

            if set_empty || matches!(self.parent_policy, ParentPolicy::DetachImmediately) {
                return self.detach(now);
            }

            net_debug!("parent selection failed, keeping the current parent");
            return None;
        };

        let Some(dodag) = &mut self.dodag else {
            return None;
        };

        // Adopt the new parent
        // ====================
        let mut send_dao = false;
        if dodag.preferred_parent != Some(parent.address()) {
            net_trace!(
                "preferred parent now {} (rank {})",
                parent.address(),
                parent.rank()
            );

            if dodag.id != parent.dio().dodag_id {
                self.routes.purge(dodag.id, dodag.instance_id);
                dodag.id = parent.dio().dodag_id;
            }
            dodag.version_number = parent.dio().version_number;

            // Downward state built through the old parent is void now.
            self.routes.remove_default_route();
            self.dao_tracker.clear();

            self.routes.set_default_route(
                parent.address(),
                RouteMeta {
                    dodag_id: dodag.id,
                    instance_id: dodag.instance_id,
                    sequence: SequenceCounter::default(),
                    expires_at: None,
                },
            );

            self.dio_timer.reset(now, &mut self.rand);
            send_dao = self.dao_enabled;
            Self::push_event(
                &mut self.events,
                Event::ParentChanged {
                    parent: parent.address(),
                },
            );
        }

        // Update our own rank
        // ===================
        let new_rank = self.objective_function.rank(parent.rank());
        if new_rank != dodag.rank {
            net_trace!("rank changed to {}", new_rank);
            dodag.rank = new_rank;
            dodag.parent_set.purge_worse(new_rank);
            Self::push_event(&mut self.events, Event::RankChanged { rank: new_rank });
        }

        dodag.preferred_parent = Some(parent.address());

        if send_dao {
            self.refresh_dao(now)
        } else {
            None
        }
    }

    /// Advertise our own address through the preferred parent.
    fn refresh_dao(&mut self, now: Instant) -> Option<Transmit> {
        let Some(dodag) = &mut self.dodag else {
            return None;
        };
        let parent = dodag.preferred_parent?;

        let (target, transit) = match self.mode_of_operation {
            ModeOfOperation::NonStoringMode => (Some(self.address), Some(parent)),
            ModeOfOperation::StoringMode => (None, None),
        };

        let (repr, sequence) = dodag.destination_advertisement_object(
            self.address,
            self.node_id,
            self.address,
            target,
            transit,
            true,
        );
        self.dao_tracker
            .send_with_ack(self.address, sequence, target, transit, now, &mut self.rand);

        let info = self.packet_info(false);
        Some(Transmit {
            dst_addr: parent,
            packet: PacketRepr {
                control: repr,
                info: Some(info),
                source_route: None,
            },
        })
    }

    /// Leave the DODAG, optionally poisoning our subtree with one last
    /// infinite rank DIO.
    fn detach(&mut self, now: Instant) -> Option<Transmit> {
        let Some(mut dodag) = self.dodag.take() else {
            return None;
        };

        net_trace!("detaching from DODAG {}", dodag.id);

        self.routes.purge(dodag.id, dodag.instance_id);
        self.dao_tracker.clear();
        self.dio_timer.suspend();
        self.detached_until = Some(now + self.detach_cooldown);

        if self.poison_on_detach {
            dodag.rank = Rank::INFINITE;
            let dio = dodag.dodag_information_object(self.node_id, self.mode_of_operation.into());
            Some(Transmit {
                dst_addr: LINK_LOCAL_ALL_RPL_NODES,
                packet: PacketRepr::new(dio),
            })
        } else {
            None
        }
    }

    /// Whether the detach cooldown still runs, transitioning back to
    /// soliciting when it passed.
    fn detached(&mut self, now: Instant) -> bool {
        match self.detached_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.detached_until = None;
                self.dis_expiration = now;
                false
            }
            None => false,
        }
    }

    fn packet_info(&self, down: bool) -> PacketInfo {
        PacketInfo {
            down,
            rank_error: false,
            forwarding_error: false,
            instance_id: self.instance_id,
            sender_rank: self.rank().raw_value(),
        }
    }

    fn push_event(events: &mut Deque<Event, { RPL_EVENTS_BUFFER_COUNT }>, event: Event) {
        if events.push_back(event).is_err() {
            events.pop_front();
            let _ = events.push_back(event);
        }
    }
}
