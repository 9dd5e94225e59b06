//! Readers and writers for the four control messages of the protocol. Every
//! message starts with a one-octet message type, followed by a fixed part
//! whose layout depends on the type. Destination advertisements additionally
//! carry a variable options part.

use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;

use super::options;
use super::{Address, AddressExt, Error, Result, ADDR_SIZE};
use crate::lollipop::SequenceCounter;

enum_with_unknown! {
    /// Control message types.
    pub enum RplControlMessage(u8) {
        DodagInformationSolicitation = 0x00,
        DodagInformationObject = 0x01,
        DestinationAdvertisementObject = 0x02,
        DestinationAdvertisementObjectAck = 0x03,
    }
}

impl fmt::Display for RplControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RplControlMessage::DodagInformationSolicitation => {
                write!(f, "DODAG information solicitation (DIS)")
            }
            RplControlMessage::DodagInformationObject => {
                write!(f, "DODAG information object (DIO)")
            }
            RplControlMessage::DestinationAdvertisementObject => {
                write!(f, "destination advertisement object (DAO)")
            }
            RplControlMessage::DestinationAdvertisementObjectAck => {
                write!(f, "destination advertisement object ack (DAO-ACK)")
            }
            RplControlMessage::Unknown(id) => write!(f, "unknown control message ({id})"),
        }
    }
}

/// A read/write wrapper around a control message.
#[derive(Debug, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::wire::field::*;

    pub const MSG_TYPE: usize = 0;
    // The RPL instance ID sits at the same offset in the DIO, the DAO and
    // the DAO-ACK.
    pub const INSTANCE_ID: usize = 1;

    // DODAG information solicitation fields.
    pub const DIS_NODE_ID: Field = 1..9;

    // DODAG information object fields.
    pub const DIO_VERSION: usize = 2;
    pub const DIO_RANK: Field = 3..5;
    pub const DIO_FLAGS: usize = 5;
    pub const DIO_DTSN: usize = 6;
    pub const DIO_DODAG_ID: Field = 7..23;
    pub const DIO_NODE_ID: Field = 23..31;

    // Destination advertisement object fields, also used by the ack.
    pub const DAO_FLAGS: usize = 2;
    pub const DAO_SEQUENCE: usize = 3;
    pub const DAO_DODAG_ID: Field = 4..20;
    pub const DAO_SRC_ADDRESS: Field = 20..36;
    pub const DAO_REACHABLE_DEST: Field = 36..52;
    pub const DAO_NODE_ID: Field = 52..60;
    pub const DAO_OPTIONS: Rest = 60..;
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Create a raw octet buffer with a control message structure.
    #[inline]
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    #[inline]
    pub fn new_checked(buffer: T) -> Result<Self> {
        let packet = Self::new_unchecked(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error)` if the buffer is too short for its message type.
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len <= field::MSG_TYPE {
            return Err(Error);
        }

        let needed = match self.msg_type() {
            RplControlMessage::DodagInformationSolicitation => field::DIS_NODE_ID.end,
            RplControlMessage::DodagInformationObject => field::DIO_NODE_ID.end,
            RplControlMessage::DestinationAdvertisementObject
            | RplControlMessage::DestinationAdvertisementObjectAck => field::DAO_NODE_ID.end,
            RplControlMessage::Unknown(_) => return Err(Error),
        };

        if len < needed {
            Err(Error)
        } else {
            Ok(())
        }
    }

    /// Return the message type field.
    #[inline]
    pub fn msg_type(&self) -> RplControlMessage {
        get!(self.buffer, into: RplControlMessage, field: field::MSG_TYPE)
    }

    /// Return the RPL instance ID field of a DIO, DAO or DAO-ACK.
    #[inline]
    pub fn rpl_instance_id(&self) -> u8 {
        get!(self.buffer, field: field::INSTANCE_ID)
    }

    /// Return the node ID field. The field offset depends on the message type.
    #[inline]
    pub fn node_id(&self) -> u64 {
        match self.msg_type() {
            RplControlMessage::DodagInformationSolicitation => {
                get!(self.buffer, u64, field: field::DIS_NODE_ID)
            }
            RplControlMessage::DodagInformationObject => {
                get!(self.buffer, u64, field: field::DIO_NODE_ID)
            }
            RplControlMessage::DestinationAdvertisementObject
            | RplControlMessage::DestinationAdvertisementObjectAck => {
                get!(self.buffer, u64, field: field::DAO_NODE_ID)
            }
            RplControlMessage::Unknown(_) => unreachable!(),
        }
    }

    /// Return the DODAG ID field. The field offset depends on the message type.
    #[inline]
    pub fn dodag_id(&self) -> Address {
        match self.msg_type() {
            RplControlMessage::DodagInformationObject => {
                get!(self.buffer, address, field: field::DIO_DODAG_ID)
            }
            RplControlMessage::DestinationAdvertisementObject
            | RplControlMessage::DestinationAdvertisementObjectAck => {
                get!(self.buffer, address, field: field::DAO_DODAG_ID)
            }
            _ => unreachable!(),
        }
    }

    /// Return the version number field of a DIO.
    #[inline]
    pub fn version_number(&self) -> u8 {
        get!(self.buffer, field: field::DIO_VERSION)
    }

    /// Return the rank field of a DIO.
    #[inline]
    pub fn rank(&self) -> u16 {
        get!(self.buffer, u16, field: field::DIO_RANK)
    }

    /// Return the mode of operation flag of a DIO. A set flag means storing
    /// mode, a cleared flag non-storing mode.
    #[inline]
    pub fn storing_mode(&self) -> bool {
        get!(self.buffer, bool, field: field::DIO_FLAGS, shift: 7, mask: 0b1)
    }

    /// Return the DTSN field of a DIO.
    #[inline]
    pub fn dtsn(&self) -> u8 {
        get!(self.buffer, field: field::DIO_DTSN)
    }

    /// Return the ack-required flag of a DAO.
    #[inline]
    pub fn is_ack_required(&self) -> bool {
        get!(self.buffer, bool, field: field::DAO_FLAGS, shift: 7, mask: 0b1)
    }

    /// Return the sequence number field of a DAO or DAO-ACK.
    #[inline]
    pub fn sequence(&self) -> u8 {
        get!(self.buffer, field: field::DAO_SEQUENCE)
    }

    /// Return the source address field of a DAO or DAO-ACK.
    #[inline]
    pub fn src_address(&self) -> Address {
        get!(self.buffer, address, field: field::DAO_SRC_ADDRESS)
    }

    /// Return the reachable destination field of a DAO or DAO-ACK.
    #[inline]
    pub fn reachable_destination(&self) -> Address {
        get!(self.buffer, address, field: field::DAO_REACHABLE_DEST)
    }
}

impl<'p, T: AsRef<[u8]> + ?Sized> Packet<&'p T> {
    /// Return a pointer to the options of a DAO.
    pub fn options(&self) -> Result<&'p [u8]> {
        match self.msg_type() {
            RplControlMessage::DestinationAdvertisementObject => {
                Ok(&self.buffer.as_ref()[field::DAO_OPTIONS])
            }
            _ => Err(Error),
        }
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the message type field.
    #[inline]
    pub fn set_msg_type(&mut self, msg_type: RplControlMessage) {
        set!(self.buffer, msg_type.into(), field: field::MSG_TYPE)
    }

    /// Set the RPL instance ID field of a DIO, DAO or DAO-ACK.
    #[inline]
    pub fn set_rpl_instance_id(&mut self, id: u8) {
        set!(self.buffer, id, field: field::INSTANCE_ID)
    }

    /// Set the node ID field. The message type field must be set first.
    #[inline]
    pub fn set_node_id(&mut self, node_id: u64) {
        match self.msg_type() {
            RplControlMessage::DodagInformationSolicitation => {
                set!(self.buffer, node_id, u64, field: field::DIS_NODE_ID)
            }
            RplControlMessage::DodagInformationObject => {
                set!(self.buffer, node_id, u64, field: field::DIO_NODE_ID)
            }
            RplControlMessage::DestinationAdvertisementObject
            | RplControlMessage::DestinationAdvertisementObjectAck => {
                set!(self.buffer, node_id, u64, field: field::DAO_NODE_ID)
            }
            RplControlMessage::Unknown(_) => unreachable!(),
        }
    }

    /// Set the DODAG ID field. The message type field must be set first.
    #[inline]
    pub fn set_dodag_id(&mut self, dodag_id: Address) {
        match self.msg_type() {
            RplControlMessage::DodagInformationObject => {
                set!(self.buffer, dodag_id, address, field: field::DIO_DODAG_ID)
            }
            RplControlMessage::DestinationAdvertisementObject
            | RplControlMessage::DestinationAdvertisementObjectAck => {
                set!(self.buffer, dodag_id, address, field: field::DAO_DODAG_ID)
            }
            _ => unreachable!(),
        }
    }

    /// Set the version number field of a DIO.
    #[inline]
    pub fn set_version_number(&mut self, version: u8) {
        set!(self.buffer, version, field: field::DIO_VERSION)
    }

    /// Set the rank field of a DIO.
    #[inline]
    pub fn set_rank(&mut self, rank: u16) {
        set!(self.buffer, rank, u16, field: field::DIO_RANK)
    }

    /// Set the mode of operation flag of a DIO.
    #[inline]
    pub fn set_storing_mode(&mut self, storing: bool) {
        set!(self.buffer, storing, bool, field: field::DIO_FLAGS, shift: 7, mask: 0b1)
    }

    /// Set the DTSN field of a DIO.
    #[inline]
    pub fn set_dtsn(&mut self, dtsn: u8) {
        set!(self.buffer, dtsn, field: field::DIO_DTSN)
    }

    /// Set the ack-required flag of a DAO.
    #[inline]
    pub fn set_is_ack_required(&mut self, ack_required: bool) {
        set!(self.buffer, ack_required, bool, field: field::DAO_FLAGS, shift: 7, mask: 0b1)
    }

    /// Set the sequence number field of a DAO or DAO-ACK.
    #[inline]
    pub fn set_sequence(&mut self, sequence: u8) {
        set!(self.buffer, sequence, field: field::DAO_SEQUENCE)
    }

    /// Set the source address field of a DAO or DAO-ACK.
    #[inline]
    pub fn set_src_address(&mut self, address: Address) {
        set!(self.buffer, address, address, field: field::DAO_SRC_ADDRESS)
    }

    /// Set the reachable destination field of a DAO or DAO-ACK.
    #[inline]
    pub fn set_reachable_destination(&mut self, address: Address) {
        set!(self.buffer, address, address, field: field::DAO_REACHABLE_DEST)
    }

    /// Return a pointer to the options of a DAO.
    pub fn options_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[field::DAO_OPTIONS]
    }
}

/// A high-level representation of a DODAG information solicitation.
///
/// ```txt
///  0                   1
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Type = 0x00  |      Node ID      .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .     Node ID (8 octets total)      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dis {
    pub node_id: u64,
}

/// A high-level representation of a DODAG information object.
///
/// ```txt
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Type = 0x01  | RPLInstanceID |Version Number |     Rank      .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .     Rank      |S|  Reserved   |     DTSN      |    DODAGID    .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .                     DODAGID (16 octets total)                 .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .    DODAGID    |            Node ID (8 octets)                 .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The `S` flag selects storing mode; non-storing mode when cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dio {
    pub rpl_instance_id: u8,
    pub version_number: SequenceCounter,
    pub rank: u16,
    pub storing_mode: bool,
    pub dtsn: SequenceCounter,
    pub dodag_id: Address,
    pub node_id: u64,
}

/// A high-level representation of a destination advertisement object.
///
/// ```txt
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Type = 0x02  | RPLInstanceID |K|  Reserved   |  DAOSequence  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      DODAGID (16 octets)                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   Source Address (16 octets)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               Reachable Destination (16 octets)               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Node ID (8 octets)                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Option(s)...
/// +-+-+-+-+-+-+-+-+
/// ```
///
/// The `K` flag requests an acknowledgment for this advertisement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dao {
    pub rpl_instance_id: u8,
    pub ack_required: bool,
    pub sequence: SequenceCounter,
    pub dodag_id: Address,
    pub src_address: Address,
    pub reachable_dest: Address,
    pub node_id: u64,
    /// Address announced as reachable by a target option.
    pub target: Option<Address>,
    /// Next hop toward the target, from a transit information option.
    pub transit: Option<Address>,
}

/// A high-level representation of a destination advertisement object ack.
///
/// Same fixed layout as [`Dao`] with the `K` flag cleared and no options; the
/// reachable destination names the acknowledged destination.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DaoAck {
    pub rpl_instance_id: u8,
    pub sequence: SequenceCounter,
    pub dodag_id: Address,
    pub src_address: Address,
    pub reachable_dest: Address,
    pub node_id: u64,
}

/// A high-level representation of a control message.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Repr {
    DodagInformationSolicitation(Dis),
    DodagInformationObject(Dio),
    DestinationAdvertisementObject(Dao),
    DestinationAdvertisementObjectAck(DaoAck),
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repr::DodagInformationSolicitation(dis) => {
                write!(f, "DIS node={:#x}", dis.node_id)
            }
            Repr::DodagInformationObject(dio) => {
                write!(
                    f,
                    "DIO dodag={} version={} rank={} dtsn={} storing={}",
                    dio.dodag_id,
                    dio.version_number.value(),
                    dio.rank,
                    dio.dtsn.value(),
                    dio.storing_mode,
                )
            }
            Repr::DestinationAdvertisementObject(dao) => {
                write!(
                    f,
                    "DAO seq={} dest={} ack={}",
                    dao.sequence.value(),
                    dao.reachable_dest,
                    dao.ack_required,
                )?;
                if let Some(target) = dao.target {
                    write!(f, " target={target}")?;
                }
                if let Some(transit) = dao.transit {
                    write!(f, " transit={transit}")?;
                }
                Ok(())
            }
            Repr::DestinationAdvertisementObjectAck(ack) => {
                write!(f, "DAO-ACK seq={} dest={}", ack.sequence.value(), ack.reachable_dest)
            }
        }
    }
}

impl Repr {
    /// Parse a control message and return a high-level representation.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(packet: &Packet<&T>) -> Result<Self> {
        packet.check_len()?;

        match packet.msg_type() {
            RplControlMessage::DodagInformationSolicitation => {
                Ok(Repr::DodagInformationSolicitation(Dis {
                    node_id: packet.node_id(),
                }))
            }
            RplControlMessage::DodagInformationObject => Ok(Repr::DodagInformationObject(Dio {
                rpl_instance_id: packet.rpl_instance_id(),
                version_number: SequenceCounter::new(packet.version_number()),
                rank: packet.rank(),
                storing_mode: packet.storing_mode(),
                dtsn: SequenceCounter::new(packet.dtsn()),
                dodag_id: packet.dodag_id(),
                node_id: packet.node_id(),
            })),
            RplControlMessage::DestinationAdvertisementObject => {
                let mut target = None;
                let mut transit = None;

                let mut options = packet.options()?;
                while !options.is_empty() {
                    let option = options::Packet::new_checked(options)?;
                    match options::Repr::parse(&option)? {
                        Some(options::Repr::Target { address }) => target = Some(address),
                        Some(options::Repr::TransitInformation { address }) => {
                            transit = Some(address)
                        }
                        None => (),
                    }

                    let skip = match option.option_type() {
                        options::OptionType::Pad1 => 1,
                        _ => 2 + option.option_length() as usize,
                    };
                    options = &options[skip..];
                }

                Ok(Repr::DestinationAdvertisementObject(Dao {
                    rpl_instance_id: packet.rpl_instance_id(),
                    ack_required: packet.is_ack_required(),
                    sequence: SequenceCounter::new(packet.sequence()),
                    dodag_id: packet.dodag_id(),
                    src_address: packet.src_address(),
                    reachable_dest: packet.reachable_destination(),
                    node_id: packet.node_id(),
                    target,
                    transit,
                }))
            }
            RplControlMessage::DestinationAdvertisementObjectAck => {
                Ok(Repr::DestinationAdvertisementObjectAck(DaoAck {
                    rpl_instance_id: packet.rpl_instance_id(),
                    sequence: SequenceCounter::new(packet.sequence()),
                    dodag_id: packet.dodag_id(),
                    src_address: packet.src_address(),
                    reachable_dest: packet.reachable_destination(),
                    node_id: packet.node_id(),
                }))
            }
            RplControlMessage::Unknown(_) => Err(Error),
        }
    }

    /// Return the length of the message that will be emitted from this
    /// high-level representation.
    pub fn buffer_len(&self) -> usize {
        match self {
            Repr::DodagInformationSolicitation(_) => field::DIS_NODE_ID.end,
            Repr::DodagInformationObject(_) => field::DIO_NODE_ID.end,
            Repr::DestinationAdvertisementObject(dao) => {
                let mut len = field::DAO_NODE_ID.end;
                if dao.target.is_some() {
                    len += 2 + ADDR_SIZE;
                }
                if dao.transit.is_some() {
                    len += 2 + ADDR_SIZE;
                }
                len
            }
            Repr::DestinationAdvertisementObjectAck(_) => field::DAO_NODE_ID.end,
        }
    }

    /// Emit a high-level representation into a control message packet.
    pub fn emit<T: AsRef<[u8]> + AsMut<[u8]>>(&self, packet: &mut Packet<T>) {
        match self {
            Repr::DodagInformationSolicitation(dis) => {
                packet.set_msg_type(RplControlMessage::DodagInformationSolicitation);
                packet.set_node_id(dis.node_id);
            }
            Repr::DodagInformationObject(dio) => {
                packet.set_msg_type(RplControlMessage::DodagInformationObject);
                packet.set_rpl_instance_id(dio.rpl_instance_id);
                packet.set_version_number(dio.version_number.value());
                packet.set_rank(dio.rank);
                packet.set_storing_mode(dio.storing_mode);
                packet.set_dtsn(dio.dtsn.value());
                packet.set_dodag_id(dio.dodag_id);
                packet.set_node_id(dio.node_id);
            }
            Repr::DestinationAdvertisementObject(dao) => {
                packet.set_msg_type(RplControlMessage::DestinationAdvertisementObject);
                packet.set_rpl_instance_id(dao.rpl_instance_id);
                packet.set_is_ack_required(dao.ack_required);
                packet.set_sequence(dao.sequence.value());
                packet.set_dodag_id(dao.dodag_id);
                packet.set_src_address(dao.src_address);
                packet.set_reachable_destination(dao.reachable_dest);
                packet.set_node_id(dao.node_id);

                let options = packet.options_mut();
                let mut offset = 0;
                if let Some(address) = dao.target {
                    let repr = options::Repr::Target { address };
                    repr.emit(&mut options::Packet::new_unchecked(
                        &mut options[offset..offset + repr.buffer_len()],
                    ));
                    offset += repr.buffer_len();
                }
                if let Some(address) = dao.transit {
                    let repr = options::Repr::TransitInformation { address };
                    repr.emit(&mut options::Packet::new_unchecked(
                        &mut options[offset..offset + repr.buffer_len()],
                    ));
                }
            }
            Repr::DestinationAdvertisementObjectAck(ack) => {
                packet.set_msg_type(RplControlMessage::DestinationAdvertisementObjectAck);
                packet.set_rpl_instance_id(ack.rpl_instance_id);
                packet.set_is_ack_required(false);
                packet.set_sequence(ack.sequence.value());
                packet.set_dodag_id(ack.dodag_id);
                packet.set_src_address(ack.src_address);
                packet.set_reachable_destination(ack.reachable_dest);
                packet.set_node_id(ack.node_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DODAG_ID: Address = Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 1);

    #[test]
    fn dis_round_trip() {
        let repr = Repr::DodagInformationSolicitation(Dis {
            node_id: 0x1122_3344_5566_7788,
        });

        let mut buffer = [0u8; 9];
        assert_eq!(repr.buffer_len(), buffer.len());
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer[0], 0x00);
        assert_eq!(&buffer[1..9], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn dio_round_trip() {
        let repr = Repr::DodagInformationObject(Dio {
            rpl_instance_id: 0x1e,
            version_number: SequenceCounter::new(240),
            rank: 0x0102,
            storing_mode: true,
            dtsn: SequenceCounter::new(241),
            dodag_id: DODAG_ID,
            node_id: 2,
        });

        let mut buffer = [0u8; 31];
        assert_eq!(repr.buffer_len(), buffer.len());
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer[0], 0x01);
        assert_eq!(buffer[3..5], [0x01, 0x02]);
        assert_eq!(buffer[5] & 0x80, 0x80);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn dao_round_trip_with_options() {
        let repr = Repr::DestinationAdvertisementObject(Dao {
            rpl_instance_id: 0x1e,
            ack_required: true,
            sequence: SequenceCounter::new(0),
            dodag_id: DODAG_ID,
            src_address: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 4),
            reachable_dest: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 4),
            node_id: 4,
            target: Some(Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 4)),
            transit: Some(Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 3)),
        });

        assert_eq!(repr.buffer_len(), 60 + 2 * 18);

        let mut buffer = [0u8; 96];
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer[0], 0x02);
        assert_eq!(buffer[2] & 0x80, 0x80);
        assert_eq!(buffer[60], 0x05);
        assert_eq!(buffer[78], 0x06);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn dao_without_options() {
        let repr = Repr::DestinationAdvertisementObject(Dao {
            rpl_instance_id: 0x1e,
            ack_required: false,
            sequence: SequenceCounter::new(4),
            dodag_id: DODAG_ID,
            src_address: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 4),
            reachable_dest: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 5),
            node_id: 4,
            target: None,
            transit: None,
        });

        assert_eq!(repr.buffer_len(), 60);

        let mut buffer = [0u8; 60];
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn dao_ack_round_trip() {
        let repr = Repr::DestinationAdvertisementObjectAck(DaoAck {
            rpl_instance_id: 0x1e,
            sequence: SequenceCounter::new(4),
            dodag_id: DODAG_ID,
            src_address: DODAG_ID,
            reachable_dest: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 4),
            node_id: 1,
        });

        let mut buffer = [0u8; 60];
        assert_eq!(repr.buffer_len(), buffer.len());
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer[0], 0x03);
        assert_eq!(buffer[2] & 0x80, 0x00);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn truncated_messages() {
        assert!(Packet::new_checked(&[][..]).is_err());
        assert!(Packet::new_checked(&[0x00, 0, 0][..]).is_err());
        assert!(Packet::new_checked(&[0x01; 30][..]).is_err());
        assert!(Packet::new_checked(&[0x02; 59][..]).is_err());
    }

    #[test]
    fn unknown_message_type() {
        let buffer = [0x7fu8; 64];
        assert!(Packet::new_checked(&buffer[..]).is_err());
    }
}
