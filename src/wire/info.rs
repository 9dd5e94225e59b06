//! The per-packet information header attached to every data packet routed
//! inside the DODAG. It records the direction of the packet and the rank of
//! the last hop, which receivers use to detect inconsistencies.

use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

/// A read/write wrapper around a packet information header.
#[derive(Debug, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::wire::field::*;

    pub const FLAGS: usize = 0;
    pub const INSTANCE_ID: usize = 1;
    pub const SENDER_RANK: Field = 2..4;
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Create a raw octet buffer with a packet information structure.
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
    /// Returns `Err(Error)` if the buffer is too short.
    #[inline]
    pub fn check_len(&self) -> Result<()> {
        if self.buffer.as_ref().len() < field::SENDER_RANK.end {
            Err(Error)
        } else {
            Ok(())
        }
    }

    /// Return the down flag. A set flag means the packet travels away from
    /// the root.
    #[inline]
    pub fn is_down(&self) -> bool {
        get!(self.buffer, bool, field: field::FLAGS, shift: 7, mask: 0b1)
    }

    /// Return the rank error flag.
    #[inline]
    pub fn has_rank_error(&self) -> bool {
        get!(self.buffer, bool, field: field::FLAGS, shift: 6, mask: 0b1)
    }

    /// Return the forwarding error flag.
    #[inline]
    pub fn has_forwarding_error(&self) -> bool {
        get!(self.buffer, bool, field: field::FLAGS, shift: 5, mask: 0b1)
    }

    /// Return the RPL instance ID field.
    #[inline]
    pub fn rpl_instance_id(&self) -> u8 {
        get!(self.buffer, field: field::INSTANCE_ID)
    }

    /// Return the sender rank field.
    #[inline]
    pub fn sender_rank(&self) -> u16 {
        get!(self.buffer, u16, field: field::SENDER_RANK)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the down flag.
    #[inline]
    pub fn set_is_down(&mut self, down: bool) {
        set!(self.buffer, down, bool, field: field::FLAGS, shift: 7, mask: 0b1)
    }

    /// Set the rank error flag.
    #[inline]
    pub fn set_has_rank_error(&mut self, error: bool) {
        set!(self.buffer, error, bool, field: field::FLAGS, shift: 6, mask: 0b1)
    }

    /// Set the forwarding error flag.
    #[inline]
    pub fn set_has_forwarding_error(&mut self, error: bool) {
        set!(self.buffer, error, bool, field: field::FLAGS, shift: 5, mask: 0b1)
    }

    /// Set the RPL instance ID field.
    #[inline]
    pub fn set_rpl_instance_id(&mut self, id: u8) {
        set!(self.buffer, id, field: field::INSTANCE_ID)
    }

    /// Set the sender rank field.
    #[inline]
    pub fn set_sender_rank(&mut self, rank: u16) {
        set!(self.buffer, rank, u16, field: field::SENDER_RANK)
    }
}

/// A high-level representation of a packet information header.
///
/// ```txt
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |O|R|F| Reservd | RPLInstanceID |          SenderRank           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketInfo {
    pub down: bool,
    pub rank_error: bool,
    pub forwarding_error: bool,
    pub instance_id: u8,
    pub sender_rank: u16,
}

impl PacketInfo {
    /// Parse a packet information header and return a high-level
    /// representation.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(packet: &Packet<&T>) -> Result<Self> {
        packet.check_len()?;

        Ok(Self {
            down: packet.is_down(),
            rank_error: packet.has_rank_error(),
            forwarding_error: packet.has_forwarding_error(),
            instance_id: packet.rpl_instance_id(),
            sender_rank: packet.sender_rank(),
        })
    }

    /// Return the length of the header that will be emitted from this
    /// high-level representation.
    pub const fn buffer_len(&self) -> usize {
        field::SENDER_RANK.end
    }

    /// Emit a high-level representation into a packet information header.
    pub fn emit<T: AsRef<[u8]> + AsMut<[u8]>>(&self, packet: &mut Packet<T>) {
        packet.set_is_down(self.down);
        packet.set_has_rank_error(self.rank_error);
        packet.set_has_forwarding_error(self.forwarding_error);
        packet.set_rpl_instance_id(self.instance_id);
        packet.set_sender_rank(self.sender_rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_info_round_trip() {
        let repr = PacketInfo {
            down: true,
            rank_error: false,
            forwarding_error: true,
            instance_id: 0x1e,
            sender_rank: 0x0300,
        };

        let mut buffer = [0u8; 4];
        assert_eq!(repr.buffer_len(), buffer.len());
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer, [0b1010_0000, 0x1e, 0x03, 0x00]);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(PacketInfo::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn flags_do_not_clobber_each_other() {
        let mut buffer = [0u8; 4];
        let mut packet = Packet::new_unchecked(&mut buffer[..]);

        packet.set_is_down(true);
        packet.set_has_rank_error(true);
        assert!(packet.is_down());
        assert!(packet.has_rank_error());
        assert!(!packet.has_forwarding_error());

        packet.set_is_down(false);
        assert!(!packet.is_down());
        assert!(packet.has_rank_error());
    }

    #[test]
    fn too_short() {
        assert!(Packet::new_checked(&[0u8; 3][..]).is_err());
    }
}
