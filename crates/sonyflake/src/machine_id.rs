//! Machine IDs derived from the host's private IPv4 address.
//!
//! ```
//! use std::net::Ipv4Addr;
//!
//! use sonyflake::machine_id;
//!
//! let ip = Ipv4Addr::new(192, 168, 1, 2);
//! assert!(machine_id::is_private_ipv4(ip));
//! assert_eq!(machine_id::lower_16_bits(ip), 0x0102);
//! assert!(!machine_id::is_private_ipv4(Ipv4Addr::new(8, 8, 8, 8)));
//! ```

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use crate::{Error, Result};

/// Returns `true` for the address ranges Sonyflake accepts as a machine
/// address: `10.0.0.0/8`, `172.16.0.0/12`, `192.168.0.0/16` and the
/// link-local `169.254.0.0/16`.
pub const fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    a == 10 || (a == 172 && b >= 16 && b < 32) || (a == 192 && b == 168) || (a == 169 && b == 254)
}

/// The lower 16 bits of `ip`, i.e. its last two octets.
pub const fn lower_16_bits(ip: Ipv4Addr) -> u16 {
    let [_, _, c, d] = ip.octets();
    u16::from_be_bytes([c, d])
}

/// The private IPv4 address the host would use for outbound traffic.
///
/// A UDP socket is "connected" to a public address, which only selects a
/// route and sends nothing, and its local address is read back.
///
/// # Errors
///
/// Returns [`Error::MachineIdUnavailable`] if no route exists or the selected
/// address is not IPv4 or not private.
pub fn private_ipv4() -> Result<Ipv4Addr> {
    let unavailable = |reason: String| Error::MachineIdUnavailable { reason };

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| unavailable(format!("bind failed: {e}")))?;
    socket
        .connect((Ipv4Addr::new(8, 8, 8, 8), 80))
        .map_err(|e| unavailable(format!("no route: {e}")))?;
    let local = socket
        .local_addr()
        .map_err(|e| unavailable(format!("no local address: {e}")))?;

    match local.ip() {
        IpAddr::V4(ip) if is_private_ipv4(ip) => Ok(ip),
        ip => Err(unavailable(format!("{ip} is not a private IPv4 address"))),
    }
}

/// The default machine ID: the lower 16 bits of the host's private IPv4
/// address.
///
/// # Errors
///
/// See [`private_ipv4`].
pub fn lower_16_bit_private_ip() -> Result<u16> {
    let ip = private_ipv4()?;
    let machine_id = lower_16_bits(ip);

    #[cfg(feature = "tracing")]
    tracing::debug!(%ip, machine_id, "derived machine id from private address");

    Ok(machine_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_ranges() {
        for ip in [
            "10.0.0.1",
            "10.255.255.255",
            "172.16.0.1",
            "172.31.255.254",
            "192.168.1.20",
            "169.254.3.4",
        ] {
            assert!(is_private_ipv4(ip.parse().unwrap()), "{ip}");
        }
    }

    #[test]
    fn public_ranges() {
        for ip in [
            "8.8.8.8",
            "172.15.255.255",
            "172.32.0.0",
            "192.169.0.1",
            "100.64.0.1",
            "127.0.0.1",
            "169.253.0.1",
        ] {
            assert!(!is_private_ipv4(ip.parse().unwrap()), "{ip}");
        }
    }

    #[test]
    fn lower_bits_are_last_two_octets() {
        assert_eq!(lower_16_bits(Ipv4Addr::new(192, 168, 1, 2)), 0x0102);
        assert_eq!(lower_16_bits(Ipv4Addr::new(10, 0, 255, 255)), u16::MAX);
        assert_eq!(lower_16_bits(Ipv4Addr::new(10, 0, 0, 0)), 0);
    }

    #[test]
    fn discovery_is_private_or_unavailable() {
        // Depends on the host network, so either outcome is accepted.
        match private_ipv4() {
            Ok(ip) => {
                assert!(is_private_ipv4(ip));
                assert_eq!(lower_16_bit_private_ip(), Ok(lower_16_bits(ip)));
            }
            Err(e) => assert!(matches!(e, Error::MachineIdUnavailable { .. })),
        }
    }
}
