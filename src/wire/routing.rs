//! The source routing header attached by a non-storing root to downward
//! packets. It lists the remaining hops toward the destination in order; each
//! relay strips its own address off the front before forwarding.

use heapless::Vec;

use super::{Address, AddressExt, Error, Result, ADDR_SIZE};
use crate::config::RPL_RELATIONS_BUFFER_COUNT;

/// A read/write wrapper around a source routing header.
#[derive(Debug, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::wire::field::*;
    use crate::wire::ADDR_SIZE;

    pub const ADDR_COUNT: usize = 0;
    pub const RESERVED: usize = 1;

    pub const fn address(index: usize) -> Field {
        let start = RESERVED + 1 + index * ADDR_SIZE;
        start..start + ADDR_SIZE
    }
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Create a raw octet buffer with a source routing header structure.
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
    /// Returns `Err(Error)` if the buffer is too short for its address count.
    #[inline]
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len <= field::RESERVED {
            return Err(Error);
        }

        if len < field::address(self.addr_count() as usize).start {
            Err(Error)
        } else {
            Ok(())
        }
    }

    /// Return the number of addresses in the header.
    #[inline]
    pub fn addr_count(&self) -> u8 {
        get!(self.buffer, field: field::ADDR_COUNT)
    }

    /// Return the address at the given index.
    ///
    /// # Panics
    /// The function panics if `index` is beyond the address count.
    #[inline]
    pub fn address_at(&self, index: usize) -> Address {
        get!(self.buffer, address, field: field::address(index))
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the number of addresses in the header.
    #[inline]
    pub fn set_addr_count(&mut self, count: u8) {
        set!(self.buffer, count, field: field::ADDR_COUNT)
    }

    /// Set the address at the given index.
    #[inline]
    pub fn set_address_at(&mut self, index: usize, address: Address) {
        set!(self.buffer, address, address, field: field::address(index))
    }
}

/// A high-level representation of a source routing header.
///
/// ```txt
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Addr Count   |   Reserved    |       Address[0], hop order   .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .                              ...                              .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceRoutingRepr {
    /// Remaining hops in forwarding order; the first entry is the next hop.
    pub addresses: Vec<Address, { RPL_RELATIONS_BUFFER_COUNT }>,
}

impl SourceRoutingRepr {
    /// Parse a source routing header and return a high-level representation.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(packet: &Packet<&T>) -> Result<Self> {
        packet.check_len()?;

        let mut addresses = Vec::new();
        for i in 0..packet.addr_count() as usize {
            addresses.push(packet.address_at(i)).map_err(|_| Error)?;
        }

        Ok(Self { addresses })
    }

    /// Return the length of the header that will be emitted from this
    /// high-level representation.
    pub fn buffer_len(&self) -> usize {
        2 + self.addresses.len() * ADDR_SIZE
    }

    /// Emit a high-level representation into a source routing header.
    pub fn emit<T: AsRef<[u8]> + AsMut<[u8]>>(&self, packet: &mut Packet<T>) {
        packet.set_addr_count(self.addresses.len() as u8);
        set!(packet.buffer, 0, field: field::RESERVED);

        for (i, address) in self.addresses.iter().enumerate() {
            packet.set_address_at(i, *address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_route_round_trip() {
        let mut repr = SourceRoutingRepr::default();
        for i in 1..=3u16 {
            repr.addresses
                .push(Address::new(0xfd00, 0, 0, 0, 0, 0, 0, i))
                .unwrap();
        }

        let mut buffer = [0u8; 2 + 3 * 16];
        assert_eq!(repr.buffer_len(), buffer.len());
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer[0], 3);
        assert_eq!(buffer[1], 0);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(packet.address_at(0), Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 1));
        assert_eq!(SourceRoutingRepr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn empty_source_route() {
        let repr = SourceRoutingRepr::default();

        let mut buffer = [0u8; 2];
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(SourceRoutingRepr::parse(&packet).unwrap(), repr);
    }

    #[test]
    fn count_beyond_buffer() {
        let buffer = [4u8, 0, 0, 0];
        assert!(Packet::new_checked(&buffer[..]).is_err());
    }

    #[test]
    fn count_beyond_capacity() {
        let mut buffer = [0u8; 2 + 17 * 16];
        buffer[0] = 17;
        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert!(SourceRoutingRepr::parse(&packet).is_err());
    }
}
