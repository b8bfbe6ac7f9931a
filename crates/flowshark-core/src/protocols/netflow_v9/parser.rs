use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{trace, warn};

use super::error::{Diagnostic, FlowSetDefect, NetFlowError};
use super::layout;
use super::model::{DataFlowSet, FlowSet, Header, Message, TemplateFlowSet};
use super::reader::NetFlowReader;
use super::registry::TemplateRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub message: Message,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn decode_datagram(
    datagram: &[u8],
    sender: SocketAddr,
    recipient: SocketAddr,
) -> Result<Option<Decoded>, NetFlowError> {
    if datagram.is_empty() {
        trace!(%sender, "datagram was not usable");
        return Ok(None);
    }

    let mut reader = NetFlowReader::new(datagram);
    let header = decode_header(&mut reader, sender, recipient)?;
    trace!(
        read = reader.position(),
        remaining = reader.remaining(),
        "decoded header"
    );

    let mut registry = TemplateRegistry::new();
    let mut flowsets = Vec::new();
    let mut diagnostics = Vec::new();

    while !reader.is_exhausted() {
        let offset = reader.position();
        let flowset_id = reader
            .read_u16_be()
            .map_err(|truncated| flowset_error(offset, FlowSetDefect::Truncated(truncated)))?;
        trace!(flowset_id, offset, "processing flowset");

        if flowset_id == layout::TEMPLATE_FLOWSET_ID {
            let template = Arc::new(decode_template(&mut reader, offset, flowset_id)?);
            registry.register(Arc::clone(&template));
            flowsets.push(FlowSet::Template(template));
        } else if let Some(template) = registry.resolve(flowset_id) {
            let data = decode_data(&mut reader, offset, flowset_id, template)?;
            flowsets.push(FlowSet::Data(data));
        } else {
            let (_, length) = read_flowset_body(&mut reader, offset)?;
            let diagnostic = Diagnostic::UnresolvedTemplateReference { flowset_id, length };
            warn!(%sender, flowset_id, "{diagnostic}");
            diagnostics.push(diagnostic);
        }

        trace!(
            read = reader.position(),
            remaining = reader.remaining(),
            "flowset done"
        );
    }

    Ok(Some(Decoded {
        message: Message::new(header, flowsets),
        diagnostics,
    }))
}

pub fn decode_message(
    datagram: &[u8],
    sender: SocketAddr,
    recipient: SocketAddr,
) -> Result<Option<Message>, NetFlowError> {
    Ok(decode_datagram(datagram, sender, recipient)?.map(|decoded| decoded.message))
}

pub(crate) fn decode_header(
    reader: &mut NetFlowReader<'_>,
    sender: SocketAddr,
    recipient: SocketAddr,
) -> Result<Header, NetFlowError> {
    let bytes = reader
        .read_slice(layout::HEADER_LEN)
        .map_err(NetFlowError::MalformedHeader)?;
    let input = NetFlowReader::new(bytes);
    let u16_at = |range| input.read_u16_be_at(range).map_err(NetFlowError::MalformedHeader);
    let u32_at = |range| input.read_u32_be_at(range).map_err(NetFlowError::MalformedHeader);
    let header = Header {
        version: u16_at(layout::VERSION_RANGE)?,
        count: u16_at(layout::COUNT_RANGE)?,
        uptime: u32_at(layout::SYS_UPTIME_RANGE)?,
        timestamp: u32_at(layout::UNIX_SECS_RANGE)?,
        flow_sequence: u32_at(layout::FLOW_SEQUENCE_RANGE)?,
        source_id: u32_at(layout::SOURCE_ID_RANGE)?,
        sender,
        recipient,
    };
    trace!(
        version = header.version,
        count = header.count,
        uptime = header.uptime,
        timestamp = header.timestamp,
        flow_sequence = header.flow_sequence,
        source_id = header.source_id,
        "header"
    );
    Ok(header)
}

pub(crate) fn decode_template(
    reader: &mut NetFlowReader<'_>,
    offset: usize,
    flowset_id: u16,
) -> Result<TemplateFlowSet, NetFlowError> {
    let (body, _) = read_flowset_body(reader, offset)?;
    let malformed = |field_count: u16, expected_len: usize| NetFlowError::MalformedTemplate {
        offset,
        field_count,
        body_len: body.len(),
        expected_len,
    };

    let mut input = NetFlowReader::new(body);
    let (template_id, field_count) = match (input.read_u16_be(), input.read_u16_be()) {
        (Ok(template_id), Ok(field_count)) => (template_id, field_count),
        _ => return Err(malformed(0, layout::TEMPLATE_HEADER_LEN)),
    };
    trace!(template_id, field_count, "template");

    let expected_len =
        layout::TEMPLATE_HEADER_LEN + usize::from(field_count) * layout::TEMPLATE_FIELD_LEN;
    if body.len() != expected_len {
        return Err(malformed(field_count, expected_len));
    }

    let mut layout_pairs = Vec::with_capacity(usize::from(field_count));
    for index in 1..=field_count {
        let pair = (input.read_u16_be(), input.read_u16_be());
        let (field_type, length) = match pair {
            (Ok(field_type), Ok(length)) => (field_type, length),
            _ => return Err(malformed(field_count, expected_len)),
        };
        trace!(index, field_count, field_type, length, "template field");
        layout_pairs.push((field_type, length));
    }
    if !input.is_exhausted() {
        return Err(malformed(field_count, expected_len));
    }

    Ok(TemplateFlowSet::new(flowset_id, template_id, layout_pairs))
}

pub(crate) fn decode_data(
    reader: &mut NetFlowReader<'_>,
    offset: usize,
    flowset_id: u16,
    template: Arc<TemplateFlowSet>,
) -> Result<DataFlowSet, NetFlowError> {
    let (body, _) = read_flowset_body(reader, offset)?;
    Ok(DataFlowSet::new(flowset_id, body.to_vec(), template))
}

// The declared length counts the 4 prefix bytes, flowset id included.
fn read_flowset_body<'a>(
    reader: &mut NetFlowReader<'a>,
    offset: usize,
) -> Result<(&'a [u8], u16), NetFlowError> {
    let length = reader
        .read_u16_be()
        .map_err(|truncated| flowset_error(offset, FlowSetDefect::Truncated(truncated)))?;
    let body_len = usize::from(length)
        .checked_sub(layout::FLOWSET_PREFIX_LEN)
        .ok_or(flowset_error(
            offset,
            FlowSetDefect::LengthBelowPrefix { length },
        ))?;
    trace!(body_len, "slicing flowset body");
    let body = reader
        .read_slice(body_len)
        .map_err(|truncated| flowset_error(offset, FlowSetDefect::Truncated(truncated)))?;
    Ok((body, length))
}

fn flowset_error(offset: usize, defect: FlowSetDefect) -> NetFlowError {
    NetFlowError::MalformedFlowSet { offset, defect }
}
