//! DODAG state and RPL configuration.
//!
//! A [`Dodag`] bundles everything a node knows about the DODAG it is part
//! of. The node owns at most one of these at a time. Joining a DODAG
//! creates one from the received DIO, detaching destroys it.

use crate::config::*;
use crate::lollipop::SequenceCounter;
use crate::of::ObjectiveFunction;
use crate::parents::ParentSet;
use crate::rank::Rank;
use crate::relations::Relations;
use crate::time::Duration;
use crate::trickle::TrickleTimer;
use crate::wire::{Address, Dao, DaoAck, Dio, Repr};

use heapless::Vec;

/// The Mode of Operation, advertised in every DIO.
///
/// It selects how downward routes are maintained. In storing mode every
/// node keeps a routing table for the destinations below it. In
/// non-storing mode only the root keeps reachability information, and
/// downward packets carry a source routing header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeOfOperation {
    #[default]
    NonStoringMode,
    StoringMode,
}

impl From<bool> for ModeOfOperation {
    fn from(storing: bool) -> Self {
        if storing {
            Self::StoringMode
        } else {
            Self::NonStoringMode
        }
    }
}

impl From<ModeOfOperation> for bool {
    fn from(mode: ModeOfOperation) -> Self {
        matches!(mode, ModeOfOperation::StoringMode)
    }
}

/// What to do when the candidate parent set becomes empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParentPolicy {
    /// Detach from the DODAG as soon as no candidate parent is left.
    #[default]
    DetachImmediately,
    /// Promote the best backup parent (equal rank) before detaching.
    PromoteBackup,
}

/// Configuration for a node that is the root of its own DODAG.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RplRootConfig {
    pub dodag_id: Address,
}

impl RplRootConfig {
    pub fn new(dodag_id: Address) -> Self {
        Self { dodag_id }
    }
}

/// Configuration of the RPL node.
#[derive(Debug, Clone)]
pub struct RplConfig {
    pub mode_of_operation: ModeOfOperation,
    pub root: Option<RplRootConfig>,
    pub objective_function: ObjectiveFunction,
    pub min_hop_rank_increase: u16,
    pub parent_policy: ParentPolicy,
    /// Accept DIOs advertising a different DODAG than the one we joined.
    pub allow_dodag_switch: bool,
    /// Advertise reachability with DAOs and track their acknowledgment.
    pub dao_enabled: bool,
    pub dao_ack_timeout: Duration,
    /// Retransmissions after which an unacknowledged DAO is dropped.
    pub dao_rtx_thresh: u8,
    pub dio_timer: TrickleTimer,
    /// Interval between DODAG solicitations while unattached.
    pub dis_interval: Duration,
    /// Time spent in the detached state, ignoring all RPL traffic.
    pub detach_cooldown: Duration,
    /// Broadcast one infinite rank DIO when leaving the DODAG.
    pub poison_on_detach: bool,
    pub instance_id: u8,
}

impl RplConfig {
    pub fn new(mode_of_operation: ModeOfOperation) -> Self {
        Self {
            mode_of_operation,
            root: None,
            objective_function: Default::default(),
            min_hop_rank_increase: DEFAULT_MIN_HOP_RANK_INCREASE,
            parent_policy: Default::default(),
            allow_dodag_switch: false,
            dao_enabled: true,
            dao_ack_timeout: DEFAULT_DAO_ACK_TIMEOUT,
            dao_rtx_thresh: DEFAULT_DAO_RTX_THRESH,
            dio_timer: TrickleTimer::default(),
            dis_interval: DEFAULT_DIS_INTERVAL,
            detach_cooldown: DEFAULT_DETACH_COOLDOWN,
            poison_on_detach: true,
            instance_id: RPL_DEFAULT_INSTANCE,
        }
    }

    pub fn add_root_config(mut self, root: RplRootConfig) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_dio_timer(mut self, timer: TrickleTimer) -> Self {
        self.dio_timer = timer;
        self
    }
}

/// A queued DAO-ACK, answered from `poll`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DaoAckRequest {
    pub(crate) to: Address,
    pub(crate) sequence: SequenceCounter,
    pub(crate) destination: Address,
}

#[derive(Debug)]
pub(crate) struct Dodag {
    pub(crate) id: Address,
    pub(crate) version_number: SequenceCounter,
    pub(crate) instance_id: u8,
    pub(crate) rank: Rank,
    /// Our own DTSN, advertised in DIOs we send.
    pub(crate) dtsn: SequenceCounter,
    pub(crate) preferred_parent: Option<Address>,
    pub(crate) parent_set: ParentSet,
    /// Target/transit pairs, only used by a non-storing root.
    pub(crate) relations: Relations,
    pub(crate) dao_seq_number: SequenceCounter,
    pub(crate) dao_acks: Vec<DaoAckRequest, { RPL_DAOS_BUFFER_COUNT }>,
}

impl Dodag {
    /// Create the DODAG state for a root node.
    pub(crate) fn root(id: Address, instance_id: u8) -> Self {
        Self {
            id,
            version_number: SequenceCounter::default(),
            instance_id,
            rank: Rank::ROOT,
            dtsn: SequenceCounter::default(),
            preferred_parent: None,
            parent_set: ParentSet::default(),
            relations: Relations::default(),
            dao_seq_number: SequenceCounter::default(),
            dao_acks: Vec::new(),
        }
    }

    /// Create the DODAG state from the first DIO heard for it. The rank
    /// stays infinite until a preferred parent is selected.
    pub(crate) fn from_dio(dio: &Dio) -> Self {
        Self {
            id: dio.dodag_id,
            version_number: dio.version_number,
            instance_id: dio.rpl_instance_id,
            rank: Rank::INFINITE,
            dtsn: SequenceCounter::default(),
            preferred_parent: None,
            parent_set: ParentSet::default(),
            relations: Relations::default(),
            dao_seq_number: SequenceCounter::default(),
            dao_acks: Vec::new(),
        }
    }

    pub(crate) fn dodag_information_object(&self, node_id: u64, storing_mode: bool) -> Repr {
        Repr::DodagInformationObject(Dio {
            rpl_instance_id: self.instance_id,
            version_number: self.version_number,
            rank: self.rank.raw_value(),
            storing_mode,
            dtsn: self.dtsn,
            dodag_id: self.id,
            node_id,
        })
    }

    /// Build a DAO advertising `destination`, consuming one sequence number.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn destination_advertisement_object(
        &mut self,
        src_address: Address,
        node_id: u64,
        destination: Address,
        target: Option<Address>,
        transit: Option<Address>,
        ack_required: bool,
    ) -> (Repr, SequenceCounter) {
        let sequence = self.dao_seq_number;
        self.dao_seq_number.increment();

        let repr = Repr::DestinationAdvertisementObject(Dao {
            rpl_instance_id: self.instance_id,
            ack_required,
            sequence,
            dodag_id: self.id,
            src_address,
            reachable_dest: destination,
            node_id,
            target,
            transit,
        });

        (repr, sequence)
    }

    pub(crate) fn destination_advertisement_object_ack(
        &self,
        src_address: Address,
        node_id: u64,
        request: &DaoAckRequest,
    ) -> Repr {
        Repr::DestinationAdvertisementObjectAck(DaoAck {
            rpl_instance_id: self.instance_id,
            sequence: request.sequence,
            dodag_id: self.id,
            src_address,
            reachable_dest: request.destination,
            node_id,
        })
    }

    pub(crate) fn schedule_dao_ack(&mut self, request: DaoAckRequest) {
        if self.dao_acks.push(request).is_err() {
            net_debug!("DAO-ACK queue full, not acknowledging {}", request.to);
        }
    }
}
