//! JSON fixture records and a builder for synthetic datagrams. Byte arrays
//! in fixtures are base64 strings.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout;
use super::model::{DataFlowSet, FlowSet, Header, Message, TemplateFlowSet};
use super::registry::TemplateRegistry;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("template flowset {flowset_id} has no templateID")]
    MissingTemplateId { flowset_id: u16 },
    #[error("template flowset {flowset_id} has no fields")]
    MissingFields { flowset_id: u16 },
    #[error("data flowset {flowset_id} has no data")]
    MissingData { flowset_id: u16 },
    #[error("data flowset {flowset_id} references a template not defined before it")]
    UnresolvedTemplate { flowset_id: u16 },
    #[error("{what} of {actual} does not fit the 16-bit wire field")]
    Oversized { what: &'static str, actual: usize },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowSetType {
    Template,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFieldRecord {
    #[serde(rename = "type")]
    pub field_type: u16,
    pub length: u16,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSetRecord {
    #[serde(rename = "type")]
    pub kind: FlowSetType,
    #[serde(rename = "flowsetID")]
    pub flowset_id: u16,
    #[serde(rename = "templateID", default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TemplateFieldRecord>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes::option"
    )]
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub version: u16,
    pub count: u16,
    pub uptime: u32,
    pub timestamp: u32,
    pub flow_sequence: u32,
    #[serde(rename = "sourceID")]
    pub source_id: u32,
    pub sender: SocketAddr,
    pub recipient: SocketAddr,
    pub flowsets: Vec<FlowSetRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeCase {
    #[serde(with = "base64_bytes")]
    pub input: Vec<u8>,
    pub expected: MessageRecord,
}

impl DecodeCase {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&FlowSet> for FlowSetRecord {
    fn from(flowset: &FlowSet) -> Self {
        match flowset {
            FlowSet::Template(template) => FlowSetRecord {
                kind: FlowSetType::Template,
                flowset_id: template.flowset_id(),
                template_id: Some(template.template_id()),
                fields: Some(
                    template
                        .fields()
                        .iter()
                        .map(|field| TemplateFieldRecord {
                            field_type: field.field_type(),
                            length: field.length(),
                            offset: field.offset(),
                        })
                        .collect(),
                ),
                data: None,
            },
            FlowSet::Data(data) => FlowSetRecord {
                kind: FlowSetType::Data,
                flowset_id: data.flowset_id(),
                template_id: None,
                fields: None,
                data: Some(data.data().to_vec()),
            },
        }
    }
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        let header = message.header();
        MessageRecord {
            version: header.version,
            count: header.count,
            uptime: header.uptime,
            timestamp: header.timestamp,
            flow_sequence: header.flow_sequence,
            source_id: header.source_id,
            sender: header.sender,
            recipient: header.recipient,
            flowsets: message.flowsets().iter().map(FlowSetRecord::from).collect(),
        }
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = FixtureError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let header = Header {
            version: record.version,
            count: record.count,
            uptime: record.uptime,
            timestamp: record.timestamp,
            flow_sequence: record.flow_sequence,
            source_id: record.source_id,
            sender: record.sender,
            recipient: record.recipient,
        };

        let mut registry = TemplateRegistry::new();
        let mut flowsets = Vec::with_capacity(record.flowsets.len());
        for flowset in record.flowsets {
            let flowset_id = flowset.flowset_id;
            match flowset.kind {
                FlowSetType::Template => {
                    let template_id = flowset
                        .template_id
                        .ok_or(FixtureError::MissingTemplateId { flowset_id })?;
                    let fields = flowset
                        .fields
                        .ok_or(FixtureError::MissingFields { flowset_id })?;
                    let template = Arc::new(TemplateFlowSet::new(
                        flowset_id,
                        template_id,
                        fields.iter().map(|f| (f.field_type, f.length)),
                    ));
                    registry.register(Arc::clone(&template));
                    flowsets.push(FlowSet::Template(template));
                }
                FlowSetType::Data => {
                    let data = flowset.data.ok_or(FixtureError::MissingData { flowset_id })?;
                    let template = registry
                        .resolve(flowset_id)
                        .ok_or(FixtureError::UnresolvedTemplate { flowset_id })?;
                    flowsets.push(FlowSet::Data(DataFlowSet::new(flowset_id, data, template)));
                }
            }
        }

        Ok(Message::new(header, flowsets))
    }
}

/// `count` defaults to the number of flowsets added. [`build`](Self::build)
/// fails instead of wrapping when a length exceeds its 16-bit field.
#[derive(Debug, Clone)]
pub struct DatagramBuilder {
    version: u16,
    count: Option<u16>,
    uptime: u32,
    timestamp: u32,
    flow_sequence: u32,
    source_id: u32,
    flowsets: Vec<PendingFlowSet>,
}

#[derive(Debug, Clone)]
enum PendingFlowSet {
    Template {
        template_id: u16,
        fields: Vec<(u16, u16)>,
    },
    Raw {
        flowset_id: u16,
        body: Vec<u8>,
    },
}

impl Default for DatagramBuilder {
    fn default() -> Self {
        Self {
            version: layout::NETFLOW_V9_VERSION,
            count: None,
            uptime: 0,
            timestamp: 0,
            flow_sequence: 0,
            source_id: 0,
            flowsets: Vec::new(),
        }
    }
}

impl DatagramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn count(mut self, count: u16) -> Self {
        self.count = Some(count);
        self
    }

    pub fn uptime(mut self, uptime: u32) -> Self {
        self.uptime = uptime;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn flow_sequence(mut self, flow_sequence: u32) -> Self {
        self.flow_sequence = flow_sequence;
        self
    }

    pub fn source_id(mut self, source_id: u32) -> Self {
        self.source_id = source_id;
        self
    }

    pub fn template(mut self, template_id: u16, fields: &[(u16, u16)]) -> Self {
        self.flowsets.push(PendingFlowSet::Template {
            template_id,
            fields: fields.to_vec(),
        });
        self
    }

    pub fn data(self, flowset_id: u16, payload: &[u8]) -> Self {
        self.raw_flowset(flowset_id, payload)
    }

    pub fn raw_flowset(mut self, flowset_id: u16, body: &[u8]) -> Self {
        self.flowsets.push(PendingFlowSet::Raw {
            flowset_id,
            body: body.to_vec(),
        });
        self
    }

    pub fn build(&self) -> Result<Vec<u8>, FixtureError> {
        let count = match self.count {
            Some(count) => count,
            None => wire_u16("flowset count", self.flowsets.len())?,
        };
        let mut datagram = Vec::with_capacity(layout::HEADER_LEN);
        datagram.extend_from_slice(&self.version.to_be_bytes());
        datagram.extend_from_slice(&count.to_be_bytes());
        datagram.extend_from_slice(&self.uptime.to_be_bytes());
        datagram.extend_from_slice(&self.timestamp.to_be_bytes());
        datagram.extend_from_slice(&self.flow_sequence.to_be_bytes());
        datagram.extend_from_slice(&self.source_id.to_be_bytes());

        for flowset in &self.flowsets {
            match flowset {
                PendingFlowSet::Template {
                    template_id,
                    fields,
                } => {
                    let mut body = Vec::with_capacity(
                        layout::TEMPLATE_HEADER_LEN + fields.len() * layout::TEMPLATE_FIELD_LEN,
                    );
                    body.extend_from_slice(&template_id.to_be_bytes());
                    body.extend_from_slice(
                        &wire_u16("template field count", fields.len())?.to_be_bytes(),
                    );
                    for (field_type, length) in fields {
                        body.extend_from_slice(&field_type.to_be_bytes());
                        body.extend_from_slice(&length.to_be_bytes());
                    }
                    push_flowset(&mut datagram, layout::TEMPLATE_FLOWSET_ID, &body)?;
                }
                PendingFlowSet::Raw { flowset_id, body } => {
                    push_flowset(&mut datagram, *flowset_id, body)?;
                }
            }
        }
        Ok(datagram)
    }
}

fn push_flowset(datagram: &mut Vec<u8>, flowset_id: u16, body: &[u8]) -> Result<(), FixtureError> {
    let length = wire_u16("flowset length", body.len() + layout::FLOWSET_PREFIX_LEN)?;
    datagram.extend_from_slice(&flowset_id.to_be_bytes());
    datagram.extend_from_slice(&length.to_be_bytes());
    datagram.extend_from_slice(body);
    Ok(())
}

fn wire_u16(what: &'static str, actual: usize) -> Result<u16, FixtureError> {
    u16::try_from(actual).map_err(|_| FixtureError::Oversized { what, actual })
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(
                #[serde(with = "crate::protocols::netflow_v9::fixture::base64_bytes")] Vec<u8>,
            );

            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(bytes)| bytes))
        }
    }
}
