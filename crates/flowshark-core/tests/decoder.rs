use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use flowshark_core::{
    CiscoFieldScheme, CiscoLengthScheme, DataFlowSet, DatagramBuilder, DecodeCase, Diagnostic,
    FieldValue, FlowSet, Message, MessageRecord, NetFlowError, Truncated, decode_datagram,
    decode_message, interpret, interpret_records,
};

fn fixture(name: &str) -> DecodeCase {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let json = fs::read_to_string(&path).unwrap();
    DecodeCase::from_json(&json).unwrap()
}

fn endpoints(case: &DecodeCase) -> (SocketAddr, SocketAddr) {
    (case.expected.sender, case.expected.recipient)
}

fn only_data(message: &Message) -> &DataFlowSet {
    let mut data = message.data_flowsets();
    let first = data.next().unwrap();
    assert!(data.next().is_none());
    first
}

fn text(value: Option<&FieldValue>) -> Option<&str> {
    value.and_then(FieldValue::as_str)
}

#[test]
fn fixtures_decode_to_expected_messages() {
    for name in ["testcase001.json", "testcase002.json"] {
        let case = fixture(name);
        let (sender, recipient) = endpoints(&case);
        let message = decode_message(&case.input, sender, recipient)
            .unwrap()
            .unwrap();
        assert_eq!(MessageRecord::from(&message), case.expected, "{name}");

        let rebuilt = Message::try_from(case.expected.clone()).unwrap();
        assert_eq!(rebuilt, message, "{name}");
    }
}

#[test]
fn ipv4_flow_records_interpret_with_cisco_names() {
    let case = fixture("testcase001.json");
    let (sender, recipient) = endpoints(&case);
    let message = decode_message(&case.input, sender, recipient)
        .unwrap()
        .unwrap();
    let data = only_data(&message);

    let records: Vec<_> = interpret_records(data, &CiscoFieldScheme)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(text(first.get_by_name("IPV4_SRC_ADDR")), Some("192.168.1.10"));
    assert_eq!(text(first.get_by_name("IPV4_DST_ADDR")), Some("10.0.0.1"));
    assert_eq!(first.get_by_name("L4_SRC_PORT"), Some(&FieldValue::I32(51_234)));
    assert_eq!(first.get_by_name("L4_DST_PORT"), Some(&FieldValue::I16(443)));
    assert_eq!(first.get_by_name("PROTOCOL"), Some(&FieldValue::I8(6)));
    assert_eq!(text(first.get_by_name("TCP_FLAGS")), Some("0x1B"));
    assert_eq!(first.get_by_name("IN_BYTES"), Some(&FieldValue::I16(4_096)));
    assert_eq!(first.get_by_name("LAST_SWITCHED"), Some(&FieldValue::I32(360_000)));

    let second = &records[1];
    assert_eq!(second.get_by_name("PROTOCOL"), Some(&FieldValue::I8(17)));
    assert_eq!(second.get_by_name("L4_DST_PORT"), Some(&FieldValue::I8(53)));

    assert_eq!(&interpret(data, &CiscoFieldScheme).unwrap(), first);
}

#[test]
fn unresolved_data_is_dropped_but_the_rest_survives() {
    let case = fixture("testcase002.json");
    let (sender, recipient) = endpoints(&case);
    let decoded = decode_datagram(&case.input, sender, recipient)
        .unwrap()
        .unwrap();

    assert_eq!(decoded.message.header().count, 3);
    assert_eq!(decoded.message.flowsets().len(), 2);
    assert_eq!(
        decoded.diagnostics,
        [Diagnostic::UnresolvedTemplateReference {
            flowset_id: 300,
            length: 8
        }]
    );

    let record = interpret(only_data(&decoded.message), &CiscoFieldScheme).unwrap();
    assert_eq!(
        text(record.get_by_name("IPV6_SRC_ADDR")),
        Some("2001:0DB8:0000:0000:0000:0000:0000:0001")
    );
    assert_eq!(text(record.get_by_name("SRC_MAC")), Some("00:11:22:33:44:55"));
    assert_eq!(text(record.get_by_name("IF_NAME")), Some("Gi0/0/1"));
}

#[test]
fn template_offsets_are_prefix_sums() {
    let lengths = [4u16, 4, 2, 2, 1, 1, 4, 4, 16, 6];
    let fields: Vec<_> = lengths
        .iter()
        .enumerate()
        .map(|(idx, len)| (idx as u16 + 1, *len))
        .collect();
    let datagram = DatagramBuilder::new().template(400, &fields).build().unwrap();
    let message = decode_message(
        &datagram,
        "10.0.0.1:1".parse().unwrap(),
        "10.0.0.2:2".parse().unwrap(),
    )
    .unwrap()
    .unwrap();

    let template = message.templates().next().unwrap();
    let mut expected = 0u32;
    for (field, len) in template.fields().iter().zip(lengths) {
        assert_eq!(field.offset(), expected);
        expected += u32::from(len);
    }
}

#[test]
fn short_datagram_is_a_header_error() {
    for len in [1usize, 4, 19] {
        let err = decode_datagram(
            &vec![0u8; len],
            "10.0.0.1:1".parse().unwrap(),
            "10.0.0.2:2".parse().unwrap(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            NetFlowError::MalformedHeader(Truncated {
                needed: 20,
                actual: len
            })
        );
    }
}

#[test]
fn synthetic_records_round_trip_through_bytes() {
    let layout = [(8u16, 4u16), (12, 4), (56, 6), (27, 16), (5, 1), (7, 2), (1, 8), (2, 9)];
    let mut payload = Vec::new();
    payload.extend_from_slice(&[172, 16, 0, 1]);
    payload.extend_from_slice(&[172, 16, 0, 2]);
    payload.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
    payload.extend_from_slice(&[0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0a]);
    payload.push(0xb8);
    payload.extend_from_slice(&8080u16.to_be_bytes());
    payload.extend_from_slice(&[0xff; 8]);
    payload.extend_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0x02]);

    let datagram = DatagramBuilder::new()
        .template(256, &layout)
        .data(256, &payload)
        .build()
        .unwrap();
    let message = decode_message(
        &datagram,
        "10.0.0.1:1".parse().unwrap(),
        "10.0.0.2:2".parse().unwrap(),
    )
    .unwrap()
    .unwrap();
    let record = interpret(only_data(&message), &CiscoFieldScheme).unwrap();

    let mut rebuilt = Vec::new();
    for (field, value) in record.iter() {
        let width = layout
            .iter()
            .find(|(type_id, _)| *type_id == field.type_id)
            .map(|(_, len)| usize::from(*len))
            .unwrap();
        match value {
            FieldValue::Text(text) if field.name.starts_with("IPV4") => {
                rebuilt.extend(text.split('.').map(|octet| octet.parse::<u8>().unwrap()));
            }
            FieldValue::Text(text) if field.name == "TOS" => {
                assert_eq!(text, "0xB8");
                rebuilt.push(u8::from_str_radix(&text[2..], 16).unwrap());
            }
            FieldValue::Text(text) if field.name.ends_with("MAC") => {
                rebuilt.extend(text.split(':').map(|b| u8::from_str_radix(b, 16).unwrap()));
            }
            FieldValue::Text(text) => {
                for group in text.split(':') {
                    rebuilt.extend_from_slice(&u16::from_str_radix(group, 16).unwrap().to_be_bytes());
                }
            }
            other => rebuilt.extend(other.to_be_bytes(width).unwrap()),
        }
    }
    assert_eq!(rebuilt, payload);

    assert!(matches!(record.get_by_name("IN_BYTES"), Some(FieldValue::Big(_))));
    assert!(matches!(record.get_by_name("IN_PKTS"), Some(FieldValue::Big(_))));
}

#[test]
fn length_only_scheme_keeps_raw_bytes() {
    let case = fixture("testcase001.json");
    let (sender, recipient) = endpoints(&case);
    let message = decode_message(&case.input, sender, recipient)
        .unwrap()
        .unwrap();
    let record = interpret(only_data(&message), &CiscoLengthScheme).unwrap();
    assert_eq!(
        record.get_by_name("IPV4_SRC_ADDR"),
        Some(&FieldValue::Bytes(vec![192, 168, 1, 10]))
    );
}

#[test]
fn templates_do_not_carry_across_datagrams() {
    let sender = "10.0.0.1:1".parse().unwrap();
    let recipient = "10.0.0.2:2".parse().unwrap();
    let first = DatagramBuilder::new().template(256, &[(8, 4)]).build().unwrap();
    let second = DatagramBuilder::new().data(256, &[10, 0, 0, 1]).build().unwrap();

    let message = decode_message(&first, sender, recipient).unwrap().unwrap();
    assert!(matches!(message.flowsets()[0], FlowSet::Template(_)));

    let decoded = decode_datagram(&second, sender, recipient).unwrap().unwrap();
    assert!(decoded.message.flowsets().is_empty());
    assert_eq!(decoded.diagnostics.len(), 1);
}
