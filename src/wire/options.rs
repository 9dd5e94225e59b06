//! Control message options carried by destination advertisements. A DAO sent
//! in non-storing mode announces reachability as a target/transit pair of
//! options, which the root stitches together into source routes.

use super::{Address, AddressExt, Error, Result, ADDR_SIZE};

/// A read/write wrapper around a control message option.
#[derive(Debug, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

enum_with_unknown! {
    pub enum OptionType(u8) {
        Pad1 = 0x00,
        Target = 0x05,
        TransitInformation = 0x06,
    }
}

impl From<&Repr> for OptionType {
    fn from(repr: &Repr) -> Self {
        match repr {
            Repr::Target { .. } => Self::Target,
            Repr::TransitInformation { .. } => Self::TransitInformation,
        }
    }
}

mod field {
    use crate::wire::field::*;

    pub const TYPE: usize = 0;
    pub const LENGTH: usize = 1;
    pub const ADDRESS: Field = 2..2 + 16;
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Create a raw octet buffer with a control message option structure.
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
        let len = self.buffer.as_ref().len();
        if len == 0 {
            return Err(Error);
        }

        match self.option_type() {
            OptionType::Pad1 => Ok(()),
            _ if len < field::LENGTH + 1 => Err(Error),
            _ if len < field::TYPE + 2 + self.option_length() as usize => Err(Error),
            _ => Ok(()),
        }
    }

    /// Return the option type field.
    #[inline]
    pub fn option_type(&self) -> OptionType {
        get!(self.buffer, into: OptionType, field: field::TYPE)
    }

    /// Return the option length field, the length of the option data in octets.
    #[inline]
    pub fn option_length(&self) -> u8 {
        get!(self.buffer, field: field::LENGTH)
    }

    /// Return the address field of a target or transit information option.
    #[inline]
    pub fn address(&self) -> Address {
        get!(self.buffer, address, field: field::ADDRESS)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the option type field.
    #[inline]
    pub fn set_option_type(&mut self, option_type: OptionType) {
        set!(self.buffer, option_type.into(), field: field::TYPE)
    }

    /// Set the option length field.
    #[inline]
    pub fn set_option_length(&mut self, length: u8) {
        set!(self.buffer, length, field: field::LENGTH)
    }

    /// Set the address field of a target or transit information option.
    #[inline]
    pub fn set_address(&mut self, address: Address) {
        set!(self.buffer, address, address, field: field::ADDRESS)
    }
}

/// A high-level representation of a control message option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Repr {
    Target {
        /// The address that is reachable.
        address: Address,
    },
    TransitInformation {
        /// The next hop on the path toward the target.
        address: Address,
    },
}

impl core::fmt::Display for Repr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Repr::Target { address } => write!(f, "TARGET {address}"),
            Repr::TransitInformation { address } => write!(f, "TRANSIT {address}"),
        }
    }
}

impl Repr {
    /// Parse a control message option and return a high-level representation.
    ///
    /// Returns `None` for padding and option types this implementation does
    /// not know; the caller skips those using the option length.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(packet: &Packet<&T>) -> Result<Option<Self>> {
        packet.check_len()?;

        match packet.option_type() {
            OptionType::Target | OptionType::TransitInformation
                if (packet.option_length() as usize) < ADDR_SIZE =>
            {
                Err(Error)
            }
            OptionType::Target => Ok(Some(Repr::Target {
                address: packet.address(),
            })),
            OptionType::TransitInformation => Ok(Some(Repr::TransitInformation {
                address: packet.address(),
            })),
            OptionType::Pad1 | OptionType::Unknown(_) => Ok(None),
        }
    }

    /// Return the length of the option that will be emitted from this
    /// high-level representation.
    pub const fn buffer_len(&self) -> usize {
        2 + ADDR_SIZE
    }

    /// Emit a high-level representation into a control message option.
    pub fn emit<T: AsRef<[u8]> + AsMut<[u8]>>(&self, packet: &mut Packet<T>) {
        packet.set_option_type(self.into());
        packet.set_option_length(ADDR_SIZE as u8);

        match self {
            Repr::Target { address } | Repr::TransitInformation { address } => {
                packet.set_address(*address);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_option_round_trip() {
        let repr = Repr::Target {
            address: Address::new(0xfd00, 0, 0, 0, 0, 0, 0, 4),
        };

        let mut buffer = [0u8; 18];
        repr.emit(&mut Packet::new_unchecked(&mut buffer[..]));

        assert_eq!(buffer[0], 0x05);
        assert_eq!(buffer[1], 16);

        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), Some(repr));
    }

    #[test]
    fn unknown_option_is_skipped() {
        let buffer = [0x09u8, 2, 0xaa, 0xbb];
        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet).unwrap(), None);
        assert_eq!(packet.option_length(), 2);
    }

    #[test]
    fn truncated_option() {
        let buffer = [0x05u8, 16, 0, 0];
        assert!(Packet::new_checked(&buffer[..]).is_err());
    }

    #[test]
    fn target_option_with_short_address_is_malformed() {
        let buffer = [0x05u8, 2, 0xaa, 0xbb];
        let packet = Packet::new_checked(&buffer[..]).unwrap();
        assert_eq!(Repr::parse(&packet), Err(Error));
    }
}
