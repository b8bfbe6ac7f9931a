use std::net::{IpAddr, SocketAddr};

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::UdpError;
use super::reader::UdpReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram<'a> {
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub payload: &'a [u8],
}

// `Ok(None)` for unsupported link types and frames without UDP, including
// non-first IP fragments.
pub fn parse_udp_datagram(
    linktype: Linktype,
    frame: &[u8],
) -> Result<Option<UdpDatagram<'_>>, UdpError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            SlicedPacket::from_ethernet(frame).map_err(|e| UdpError::Slice(e.to_string()))?
        }
        Linktype::LINUX_SLL => {
            SlicedPacket::from_linux_sll(frame).map_err(|e| UdpError::Slice(e.to_string()))?
        }
        Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => {
            SlicedPacket::from_ip(frame).map_err(|e| UdpError::Slice(e.to_string()))?
        }
        _ => return Ok(None),
    };

    let net = sliced.net.ok_or(UdpError::MissingNetworkLayer)?;
    let Some(TransportSlice::Udp(udp)) = sliced.transport else {
        return Ok(None);
    };

    let (source_ip, destination_ip) = match &net {
        NetSlice::Ipv4(ipv4) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        NetSlice::Ipv6(ipv6) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
    };

    let payload = UdpReader::new(udp.slice()).payload()?;

    Ok(Some(UdpDatagram {
        source: SocketAddr::new(source_ip, udp.source_port()),
        destination: SocketAddr::new(destination_ip, udp.destination_port()),
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    use super::parse_udp_datagram;
    use crate::analysis::udp::error::UdpError;

    #[test]
    fn extracts_endpoints_and_payload() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
            .udp(50_000, 2055);
        let payload = [0, 9, 0, 0];
        let mut frame = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let datagram = parse_udp_datagram(Linktype::ETHERNET, &frame).unwrap().unwrap();
        assert_eq!(datagram.source, "192.168.0.1:50000".parse().unwrap());
        assert_eq!(datagram.destination, "192.168.0.2:2055".parse().unwrap());
        assert_eq!(datagram.payload, payload);
    }

    #[test]
    fn raw_ipv6_frames() {
        let builder = PacketBuilder::ipv6([0x20; 16], [0x30; 16], 64).udp(9995, 9995);
        let payload = [1, 2, 3];
        let mut frame = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let datagram = parse_udp_datagram(Linktype::RAW, &frame).unwrap().unwrap();
        assert_eq!(datagram.destination.port(), 9995);
        assert!(datagram.source.is_ipv6());
        assert_eq!(datagram.payload, payload);
    }

    #[test]
    fn tcp_is_not_a_datagram() {
        let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(1000, 2055, 0, 0);
        let mut frame = Vec::with_capacity(builder.size(4));
        builder.write(&mut frame, &[0u8; 4]).unwrap();

        assert!(parse_udp_datagram(Linktype::ETHERNET, &frame).unwrap().is_none());
    }

    #[test]
    fn unsupported_link_type_is_skipped() {
        assert!(parse_udp_datagram(Linktype::NULL, &[0; 32]).unwrap().is_none());
    }

    #[test]
    fn empty_frame_fails_to_slice() {
        assert!(matches!(
            parse_udp_datagram(Linktype::ETHERNET, &[]),
            Err(UdpError::Slice(_))
        ));
    }
}
