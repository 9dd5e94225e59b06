/*! Low-level packet access and construction.

The `wire` module deals with the packet *representation*. It provides two levels
of functionality.

 * First, it provides functions to extract fields from sequences of octets,
   and to insert fields into sequences of octets. This happens through the `Packet`
   family of structures, e.g. [control::Packet] or [info::Packet].
 * Second, in cases where the space of valid field values is much smaller than the space
   of possible field values, it provides a compact, high-level representation
   of packet data that can be parsed from and emitted into a sequence of octets.
   This happens through the `Repr` family of structs and enums, e.g. [control::Repr]
   or [PacketInfo].

[control::Packet]: control/struct.Packet.html
[control::Repr]: control/enum.Repr.html
[info::Packet]: info/struct.Packet.html
[PacketInfo]: struct.PacketInfo.html

The functions in the `wire` module are designed for use together with `-Cpanic=abort`.

The `Packet` family of data structures guarantees that, if the `Packet::check_len()` method
returned `Ok(())`, then no accessor or setter method will panic; however, the guarantee
provided by `Packet::check_len()` may no longer hold after changing certain fields,
which are listed in the documentation for the specific packet.

The `Packet::new_checked` method is a shorthand for a combination of `Packet::new_unchecked`
and `Packet::check_len`.
When parsing untrusted input, it is *necessary* to use `Packet::new_checked()`;
so long as the buffer is not modified, no accessor will fail.
When emitting output, though, it is *incorrect* to use `Packet::new_checked()`;
the length check is likely to succeed on a zeroed buffer, but fail on a buffer
filled with data from a previous packet, such as when reusing buffers, resulting
in nondeterministic panics with some network devices but not others.
The buffer length for emission is not calculated by the `Packet` layer.

In the `Repr` family of data structures, the `Repr::parse()` method never panics
as long as `Packet::new_checked()` (or `Packet::check_len()`) has succeeded, and
the `Repr::emit()` method never panics as long as the underlying buffer is exactly
`Repr::buffer_len()` octets long.
*/

mod field {
    pub type Field = ::core::ops::Range<usize>;
    pub type Rest = ::core::ops::RangeFrom<usize>;
}

macro_rules! get {
    ($buffer:expr, field: $field:expr $(,)?) => {
        get!($buffer, u8, field: $field,)
    };

    ($buffer:expr, u8, field: $field:expr $(,)?) => {
        $buffer.as_ref()[$field]
    };

    ($buffer:expr, u16, field: $field:expr $(,)?) => {
        NetworkEndian::read_u16(&$buffer.as_ref()[$field])
    };

    ($buffer:expr, u64, field: $field:expr $(,)?) => {
        NetworkEndian::read_u64(&$buffer.as_ref()[$field])
    };

    ($buffer:expr, bool, field: $field:expr, shift: $shift:expr, mask: $mask:expr $(,)?) => {
        (($buffer.as_ref()[$field] >> $shift) & $mask) == 1
    };

    ($buffer:expr, into: $into:ty, field: $field:expr $(,)?) => {
        <$into>::from(get!($buffer, u8, field: $field))
    };

    ($buffer:expr, address, field: $field:expr $(,)?) => {
        Address::from_bytes(&$buffer.as_ref()[$field])
    };
}

macro_rules! set {
    ($buffer:expr, $value:expr, field: $field:expr $(,)?) => {
        set!($buffer, $value, u8, field: $field)
    };

    ($buffer:expr, $value:expr, u8, field: $field:expr $(,)?) => {
        $buffer.as_mut()[$field] = $value
    };

    ($buffer:expr, $value:expr, u16, field: $field:expr $(,)?) => {
        NetworkEndian::write_u16(&mut $buffer.as_mut()[$field], $value)
    };

    ($buffer:expr, $value:expr, u64, field: $field:expr $(,)?) => {
        NetworkEndian::write_u64(&mut $buffer.as_mut()[$field], $value)
    };

    ($buffer:expr, $value:expr, bool, field: $field:expr, shift: $shift:expr, mask: $mask:expr $(,)?) => {{
        let raw = $buffer.as_ref()[$field];
        let raw = if $value {
            raw | ($mask << $shift)
        } else {
            raw & !($mask << $shift)
        };
        $buffer.as_mut()[$field] = raw;
    }};

    ($buffer:expr, $value:expr, address, field: $field:expr $(,)?) => {
        $buffer.as_mut()[$field].copy_from_slice(&$value.octets())
    };
}

pub mod control;
pub mod info;
pub mod options;
pub mod routing;

pub use self::control::{Dao, DaoAck, Dio, Dis, Packet, Repr, RplControlMessage};
pub use self::info::PacketInfo;
pub use self::routing::SourceRoutingRepr;

/// Parsing error.
///
/// The packet is malformed, or it is not supported by this implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Error;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "wire::Error")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

/// Size of an IPv6 address in octets.
///
/// [RFC 4291 § 2]: https://www.rfc-editor.org/rfc/rfc4291#section-2
pub const ADDR_SIZE: usize = 16;

/// The link-local [all RPL nodes multicast address].
///
/// [all RPL nodes multicast address]: https://www.rfc-editor.org/rfc/rfc6550.html#section-20.19
pub const LINK_LOCAL_ALL_RPL_NODES: Address = Address::new(0xff02, 0, 0, 0, 0, 0, 0, 0x1a);

pub use core::net::Ipv6Addr as Address;

pub trait AddressExt {
    /// Construct an IPv6 address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not sixteen octets long.
    fn from_bytes(data: &[u8]) -> Address;

    /// Query whether the IPv6 address is an [unicast address].
    ///
    /// [unicast address]: https://tools.ietf.org/html/rfc4291#section-2.5
    fn x_is_unicast(&self) -> bool;

    /// Query whether the IPv6 address is in the [link-local] scope.
    ///
    /// [link-local]: https://tools.ietf.org/html/rfc4291#section-2.5.6
    fn is_link_local(&self) -> bool;
}

impl AddressExt for Address {
    fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; ADDR_SIZE];
        bytes.copy_from_slice(data);
        Address::from(bytes)
    }

    fn x_is_unicast(&self) -> bool {
        !(self.is_multicast() || self.is_unspecified())
    }

    fn is_link_local(&self) -> bool {
        self.octets()[0..8] == [0xfe, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_from_bytes() {
        let bytes = [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01];
        let addr = Address::from_bytes(&bytes);
        assert_eq!(addr, Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 1));
        assert_eq!(addr.octets(), bytes);
    }

    #[test]
    fn address_predicates() {
        assert!(Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 1).is_link_local());
        assert!(!Address::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1).is_link_local());
        assert!(Address::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1).x_is_unicast());
        assert!(!LINK_LOCAL_ALL_RPL_NODES.x_is_unicast());
        assert!(LINK_LOCAL_ALL_RPL_NODES.is_multicast());
    }
}
