//! A small radio network for whole-protocol tests. Every node runs its own
//! RPL engine and has a position and a radio range; control messages travel
//! between nodes as encoded bytes, so each exchange passes through the wire
//! layer on both ends.

use smol_rpl::time::{Duration, Instant};
use smol_rpl::wire::{
    Address, Packet, PacketInfo, Repr, SourceRoutingRepr, LINK_LOCAL_ALL_RPL_NODES,
};
use smol_rpl::{ModeOfOperation, PacketMeta, RplConfig, RplNode, RplRootConfig, Transmit};

/// Build a network with a root at the origin and `levels` rings of `nodes`
/// nodes around it, one ring per 100 distance units. With the default range
/// of 101, each ring only hears the adjacent rings.
pub fn topology(
    mut sim: NetworkSim,
    mop: ModeOfOperation,
    nodes: usize,
    levels: usize,
) -> NetworkSim {
    let pos = Position((0., 0.));
    let root = sim.create_node(
        RplConfig::new(mop).add_root_config(RplRootConfig::new(Address::UNSPECIFIED)),
    );
    root.set_position(pos);

    let interval = (360. / 180. * std::f64::consts::PI / nodes as f64) as f32;
    for level in 0..levels {
        for node in 0..nodes {
            let node_p = (
                pos.x() + 100. * f32::cos(interval * node as f32) * (level + 1) as f32,
                pos.y() + 100. * f32::sin(interval * node as f32) * (level + 1) as f32,
            );
            let node = sim.create_node(RplConfig::new(mop));
            node.set_position(node_p.into());
        }
    }

    sim
}

pub struct NetworkSim {
    pub nodes: Vec<Node>,
    pub messages: Vec<Message>,
    pub now: Instant,
}

impl Default for NetworkSim {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkSim {
    /// Create a new network. Engine traces go to `env_logger`, enable them
    /// with `RUST_LOG=trace`.
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        Self {
            nodes: vec![],
            messages: vec![],
            now: Instant::ZERO,
        }
    }

    /// Create a new node. A root configuration is rewritten to use the
    /// node's own address as the DODAG ID.
    pub fn create_node(&mut self, mut config: RplConfig) -> &mut Node {
        let id = self.nodes.len();
        let address = Address::new(0xfe80, 0, 0, 0, 0, 0, 0, id as u16 + 1);

        if config.root.is_some() {
            config.root = Some(RplRootConfig::new(address));
        }

        let node = Node::new(id, address, config, self.now);
        self.nodes.push(node);
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node_from_address(&self, address: Address) -> Option<&Node> {
        self.nodes.iter().find(|node| node.address == address)
    }

    pub fn msgs(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear_msgs(&mut self) {
        self.messages.clear();
    }

    /// Run the simulation for the given duration. Time advances to the
    /// earliest engine deadline, capped by `step`.
    pub fn run(&mut self, step: Duration, duration: Duration) {
        let end = self.now + duration;

        while self.now < end {
            self.on_tick();

            let granule = self.now + Duration::from_millis(1);
            let mut next = self.now + step;
            for node in self.nodes.iter().filter(|node| node.enabled) {
                if !node.queue.is_empty() {
                    next = next.min(granule);
                } else if let Some(at) = node.rpl.poll_at() {
                    next = next.min(at.max(granule));
                }
            }

            self.now = next;
        }
    }

    /// Let the engines speak, then deliver everything that was put on the
    /// air. Replies are queued for the next tick.
    pub fn on_tick(&mut self) {
        for node in self.nodes.iter_mut().filter(|node| node.enabled) {
            while let Some(transmit) = node.rpl.poll(self.now) {
                node.queue.push(transmit);
            }
        }

        let mut in_flight = vec![];
        for node in self.nodes.iter_mut().filter(|node| node.enabled) {
            for transmit in node.queue.drain(..) {
                in_flight.push((node.id, node.position, node.address, transmit));
            }
        }

        for (sender, position, src_addr, transmit) in in_flight {
            let mut data = vec![0u8; transmit.packet.control.buffer_len()];
            transmit
                .packet
                .control
                .emit(&mut Packet::new_unchecked(&mut data[..]));

            self.messages.push(Message {
                at: self.now,
                from: src_addr,
                to: transmit.dst_addr,
                data: data.clone(),
                info: transmit.packet.info,
                source_route: transmit.packet.source_route.clone(),
            });

            let broadcast = transmit.dst_addr == LINK_LOCAL_ALL_RPL_NODES;

            for node in self.nodes.iter_mut() {
                if !node.enabled
                    || node.id == sender
                    || node.position.distance(&position) > node.range
                    || (!broadcast && node.address != transmit.dst_addr)
                {
                    continue;
                }

                let packet = Packet::new_checked(&data[..]).unwrap();
                let repr = Repr::parse(&packet).unwrap();
                let meta = PacketMeta {
                    src_addr,
                    dst_addr: transmit.dst_addr,
                };

                if let Ok(Some(reply)) = node.rpl.process(self.now, meta, repr) {
                    node.queue.push(reply);
                }
            }
        }
    }
}

pub struct Node {
    pub id: usize,
    pub address: Address,
    pub position: Position,
    pub range: f32,
    pub enabled: bool,
    pub rpl: RplNode,
    queue: Vec<Transmit>,
}

impl Node {
    /// Create a new node.
    pub fn new(id: usize, address: Address, config: RplConfig, now: Instant) -> Self {
        let node_id = id as u64 + 1;
        let rpl = RplNode::new(config, address, node_id, 0x1234_5678 + node_id, now);

        Self {
            id,
            address,
            position: Position::from((0., 0.)),
            range: 101.,
            enabled: true,
            rpl,
            queue: vec![],
        }
    }

    /// Set the position of the node.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Position(pub (f32, f32));

impl Position {
    pub fn distance(&self, other: &Self) -> f32 {
        ((other.0 .0 - self.0 .0).powf(2.0) + (other.0 .1 - self.0 .1).powf(2.0)).sqrt()
    }

    pub fn x(&self) -> f32 {
        self.0 .0
    }

    pub fn y(&self) -> f32 {
        self.0 .1
    }
}

impl From<(f32, f32)> for Position {
    fn from(pos: (f32, f32)) -> Self {
        Position(pos)
    }
}

/// One transmission captured from the air: the encoded control message plus
/// the packet info and source routing headers that traveled with it.
#[derive(Debug, Clone)]
pub struct Message {
    pub at: Instant,
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    pub info: Option<PacketInfo>,
    pub source_route: Option<SourceRoutingRepr>,
}

impl Message {
    pub fn is_broadcast(&self) -> bool {
        self.to == LINK_LOCAL_ALL_RPL_NODES
    }

    pub fn repr(&self) -> Repr {
        let packet = Packet::new_checked(&self.data[..]).unwrap();
        Repr::parse(&packet).unwrap()
    }

    pub fn is_dis(&self) -> bool {
        matches!(self.repr(), Repr::DodagInformationSolicitation(_))
    }

    pub fn is_dio(&self) -> bool {
        matches!(self.repr(), Repr::DodagInformationObject(_))
    }

    pub fn is_dao(&self) -> bool {
        matches!(self.repr(), Repr::DestinationAdvertisementObject(_))
    }

    pub fn is_dao_ack(&self) -> bool {
        matches!(self.repr(), Repr::DestinationAdvertisementObjectAck(_))
    }
}
