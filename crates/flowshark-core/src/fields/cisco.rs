//! Cisco NetFlow v9 field types 0 through 105.
//!
//! Names and nominal lengths follow Cisco's published field type table.
//! Entry 105 (`SALT`) is a non-standard extension seen in the wild.

use super::ValueKind::{Ascii, Bytes, HexByte, Ipv4, Ipv6, Mac, Unsigned};
use super::{Field, FieldScheme, ValueKind, first_misplaced};

/// Cisco field types with value kinds, indexed by type id.
pub const CISCO_FIELDS: [Field; 106] = [
    Field::new(0, "RESERVED", 0, Bytes),
    Field::new(1, "IN_BYTES", 0, Unsigned),
    Field::new(2, "IN_PKTS", 0, Unsigned),
    Field::new(3, "FLOWS", 0, Unsigned),
    Field::new(4, "PROTOCOL", 1, Unsigned),
    Field::new(5, "TOS", 1, HexByte),
    Field::new(6, "TCP_FLAGS", 1, HexByte),
    Field::new(7, "L4_SRC_PORT", 2, Unsigned),
    Field::new(8, "IPV4_SRC_ADDR", 4, Ipv4),
    Field::new(9, "SRC_MASK", 1, HexByte),
    Field::new(10, "INPUT_SNMP", 0, Unsigned),
    Field::new(11, "L4_DST_PORT", 2, Unsigned),
    Field::new(12, "IPV4_DST_ADDR", 4, Ipv4),
    Field::new(13, "DST_MASK", 1, HexByte),
    Field::new(14, "OUTPUT_SNMP", 0, Unsigned),
    Field::new(15, "IPV4_NEXT_HOP", 4, Ipv4),
    Field::new(16, "SRC_AS", 0, Unsigned),
    Field::new(17, "DST_AS", 0, Unsigned),
    Field::new(18, "BGP_IPV4_NEXT_HOP", 4, Ipv4),
    Field::new(19, "MUL_DST_PKTS", 0, Unsigned),
    Field::new(20, "MUL_DST_BYTES", 0, Unsigned),
    Field::new(21, "LAST_SWITCHED", 4, Unsigned),
    Field::new(22, "FIRST_SWITCHED", 4, Unsigned),
    Field::new(23, "OUT_BYTES", 0, Unsigned),
    Field::new(24, "OUT_PKTS", 0, Unsigned),
    Field::new(25, "MIN_PKT_LNGTH", 2, Unsigned),
    Field::new(26, "MAX_PKT_LNGTH", 2, Unsigned),
    Field::new(27, "IPV6_SRC_ADDR", 16, Ipv6),
    Field::new(28, "IPV6_DST_ADDR", 16, Ipv6),
    Field::new(29, "IPV6_SRC_MASK", 1, HexByte),
    Field::new(30, "IPV6_DST_MASK", 1, HexByte),
    Field::new(31, "IPV6_FLOW_LABEL", 3, Unsigned),
    Field::new(32, "ICMP_TYPE", 2, Unsigned),
    Field::new(33, "MUL_IGMP_TYPE", 1, Unsigned),
    Field::new(34, "SAMPLING_INTERVAL", 4, Unsigned),
    Field::new(35, "SAMPLING_ALGORITHM", 1, HexByte),
    Field::new(36, "FLOW_ACTIVE_TIMEOUT", 2, Unsigned),
    Field::new(37, "FLOW_INACTIVE_TIMEOUT", 2, Unsigned),
    Field::new(38, "ENGINE_TYPE", 1, Unsigned),
    Field::new(39, "ENGINE_ID", 1, Unsigned),
    Field::new(40, "TOTAL_BYTES_EXP", 0, Unsigned),
    Field::new(41, "TOTAL_PKTS_EXP", 0, Unsigned),
    Field::new(42, "TOTAL_FLOWS_EXP", 0, Unsigned),
    Field::new(43, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(44, "IPV4_SRC_PREFIX", 4, Ipv4),
    Field::new(45, "IPV4_DST_PREFIX", 4, Ipv4),
    Field::new(46, "MPLS_TOP_LABEL_TYPE", 1, Unsigned),
    Field::new(47, "MPLS_TOP_LABEL_IP_ADDR", 4, Ipv4),
    Field::new(48, "FLOW_SAMPLER_ID", 1, Unsigned),
    Field::new(49, "FLOW_SAMPLER_MODE", 1, Unsigned),
    Field::new(50, "FLOW_SAMPLER_RANDOM_INTERVAL", 4, Unsigned),
    Field::new(51, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(52, "MIN_TTL", 1, Unsigned),
    Field::new(53, "MAX_TTL", 1, Unsigned),
    Field::new(54, "IPV4_IDENT", 2, Unsigned),
    Field::new(55, "DST_TOS", 1, HexByte),
    Field::new(56, "SRC_MAC", 6, Mac),
    Field::new(57, "DST_MAC", 6, Mac),
    Field::new(58, "SRC_VLAN", 2, Unsigned),
    Field::new(59, "DST_VLAN", 2, Unsigned),
    Field::new(60, "IP_PROTOCOL_VERSION", 1, Unsigned),
    Field::new(61, "DIRECTION", 1, Unsigned),
    Field::new(62, "IPV6_NEXT_HOP", 16, Ipv6),
    Field::new(63, "BGP_IPV6_NEXT_HOP", 16, Ipv6),
    Field::new(64, "IPV6_OPTION_HEADERS", 4, Bytes),
    Field::new(65, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(66, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(67, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(68, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(69, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(70, "MPLS_LABEL_1", 3, Bytes),
    Field::new(71, "MPLS_LABEL_2", 3, Bytes),
    Field::new(72, "MPLS_LABEL_3", 3, Bytes),
    Field::new(73, "MPLS_LABEL_4", 3, Bytes),
    Field::new(74, "MPLS_LABEL_5", 3, Bytes),
    Field::new(75, "MPLS_LABEL_6", 3, Bytes),
    Field::new(76, "MPLS_LABEL_7", 3, Bytes),
    Field::new(77, "MPLS_LABEL_8", 3, Bytes),
    Field::new(78, "MPLS_LABEL_9", 3, Bytes),
    Field::new(79, "MPLS_LABEL_10", 3, Bytes),
    Field::new(80, "IN_DST_MAC", 6, Mac),
    Field::new(81, "OUT_SRC_MAC", 6, Mac),
    Field::new(82, "IF_NAME", 0, Ascii),
    Field::new(83, "IF_DESC", 0, Ascii),
    Field::new(84, "SAMPLER_NAME", 0, Ascii),
    Field::new(85, "IN_PERMANENT_BYTES", 0, Unsigned),
    Field::new(86, "IN_PERMANENT_PKTS", 0, Unsigned),
    Field::new(87, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(88, "FRAGMENT_OFFSET", 2, Unsigned),
    Field::new(89, "FORWARDING_STATUS", 1, Unsigned),
    Field::new(90, "MPLS_PAL_RD", 8, Bytes),
    Field::new(91, "MPLS_PREFIX_LEN", 1, Unsigned),
    Field::new(92, "SRC_TRAFFIC_INDEX", 4, Unsigned),
    Field::new(93, "DST_TRAFFIC_INDEX", 4, Unsigned),
    Field::new(94, "APPLICATION_DESCRIPTION", 0, Ascii),
    Field::new(95, "APPLICATION_TAG", 0, Bytes),
    Field::new(96, "APPLICATION_NAME", 0, Ascii),
    Field::new(97, "VENDOR_PROPRIETARY", 0, Bytes),
    Field::new(98, "postipDiffServCodePoint", 1, HexByte),
    Field::new(99, "replication_factor", 4, Unsigned),
    Field::new(100, "DEPRECATED", 0, Bytes),
    Field::new(101, "RESERVED", 0, Bytes),
    Field::new(102, "layer2packetSectionOffset", 0, Unsigned),
    Field::new(103, "layer2packetSectionSize", 0, Unsigned),
    Field::new(104, "layer2packetSectionData", 0, Bytes),
    Field::new(105, "SALT", 200, Bytes),
];

const _: () = assert!(
    first_misplaced(&CISCO_FIELDS).is_none(),
    "CISCO_FIELDS entries must sit at the index of their type id"
);

static CISCO_LENGTH_FIELDS: [Field; CISCO_FIELDS.len()] = raw_bytes(CISCO_FIELDS);

const fn raw_bytes<const N: usize>(mut table: [Field; N]) -> [Field; N] {
    let mut index = 0;
    while index < N {
        table[index].kind = ValueKind::Bytes;
        index += 1;
    }
    table
}

/// Cisco field names with typed values: addresses, counters, text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CiscoFieldScheme;

impl FieldScheme for CiscoFieldScheme {
    fn name(&self) -> &'static str {
        "cisco"
    }

    fn field(&self, type_id: u16) -> Option<&Field> {
        CISCO_FIELDS.get(usize::from(type_id))
    }
}

/// Cisco field names and lengths only; every value stays raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CiscoLengthScheme;

impl FieldScheme for CiscoLengthScheme {
    fn name(&self) -> &'static str {
        "cisco-lengths"
    }

    fn field(&self, type_id: u16) -> Option<&Field> {
        CISCO_LENGTH_FIELDS.get(usize::from(type_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{CISCO_FIELDS, CiscoFieldScheme, CiscoLengthScheme};
    use crate::fields::{FieldScheme, ValueKind, first_misplaced};

    #[test]
    fn table_is_dense() {
        assert_eq!(first_misplaced(&CISCO_FIELDS), None);
        assert_eq!(CISCO_FIELDS.len(), 106);
    }

    #[test]
    fn well_known_entries() {
        let scheme = CiscoFieldScheme;
        let src = scheme.field(8).unwrap();
        assert_eq!(src.name, "IPV4_SRC_ADDR");
        assert_eq!(src.length, 4);
        assert_eq!(src.kind, ValueKind::Ipv4);

        assert_eq!(scheme.field(1).unwrap().name, "IN_BYTES");
        assert_eq!(scheme.field(1).unwrap().kind, ValueKind::Unsigned);
        assert_eq!(scheme.field(56).unwrap().kind, ValueKind::Mac);
        assert_eq!(scheme.field(27).unwrap().kind, ValueKind::Ipv6);
        assert_eq!(scheme.field(82).unwrap().kind, ValueKind::Ascii);
        assert_eq!(scheme.field(6).unwrap().kind, ValueKind::HexByte);
        assert_eq!(scheme.field(105).unwrap().name, "SALT");
        assert_eq!(scheme.field(105).unwrap().length, 200);
    }

    #[test]
    fn unknown_ids_do_not_resolve() {
        assert!(CiscoFieldScheme.field(106).is_none());
        assert!(CiscoLengthScheme.field(u16::MAX).is_none());
    }

    #[test]
    fn length_scheme_shares_names_but_keeps_bytes() {
        for (rich, raw) in (0..=105).map(|id| {
            (
                CiscoFieldScheme.field(id).unwrap(),
                CiscoLengthScheme.field(id).unwrap(),
            )
        }) {
            assert_eq!(rich.name, raw.name);
            assert_eq!(rich.length, raw.length);
            assert_eq!(raw.kind, ValueKind::Bytes);
        }
    }
}
