use std::net::SocketAddr;
use std::sync::Arc;

use super::layout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub count: u16,
    pub uptime: u32,
    pub timestamp: u32,
    pub flow_sequence: u32,
    pub source_id: u32,
    pub sender: SocketAddr,
    pub recipient: SocketAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateField {
    field_type: u16,
    length: u16,
    offset: u32,
}

impl TemplateField {
    pub fn field_type(&self) -> u16 {
        self.field_type
    }

    /// Declared length in bytes; 0 marks a variable-length field.
    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn is_variable(&self) -> bool {
        self.length == 0
    }
}

/// Field offsets are the exclusive prefix sums of the declared lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFlowSet {
    flowset_id: u16,
    template_id: u16,
    fields: Vec<TemplateField>,
}

impl TemplateFlowSet {
    pub fn new(
        flowset_id: u16,
        template_id: u16,
        layout: impl IntoIterator<Item = (u16, u16)>,
    ) -> Self {
        let mut offset = 0u32;
        let fields = layout
            .into_iter()
            .map(|(field_type, length)| {
                let field = TemplateField {
                    field_type,
                    length,
                    offset,
                };
                offset += u32::from(length);
                field
            })
            .collect();
        Self {
            flowset_id,
            template_id,
            fields,
        }
    }

    pub fn flowset_id(&self) -> u16 {
        self.flowset_id
    }

    pub fn template_id(&self) -> u16 {
        self.template_id
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn record_len(&self) -> usize {
        self.fields.iter().map(|f| usize::from(f.length)).sum()
    }

    pub fn has_variable_fields(&self) -> bool {
        self.fields.iter().any(TemplateField::is_variable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFlowSet {
    flowset_id: u16,
    data: Vec<u8>,
    template: Option<Arc<TemplateFlowSet>>,
}

impl DataFlowSet {
    pub fn new(flowset_id: u16, data: Vec<u8>, template: Arc<TemplateFlowSet>) -> Self {
        Self {
            flowset_id,
            data,
            template: Some(template),
        }
    }

    pub fn detached(flowset_id: u16, data: Vec<u8>) -> Self {
        Self {
            flowset_id,
            data,
            template: None,
        }
    }

    pub fn flowset_id(&self) -> u16 {
        self.flowset_id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn template(&self) -> Option<&TemplateFlowSet> {
        self.template.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSet {
    Template(Arc<TemplateFlowSet>),
    Data(DataFlowSet),
}

impl FlowSet {
    pub fn flowset_id(&self) -> u16 {
        match self {
            FlowSet::Template(template) => template.flowset_id(),
            FlowSet::Data(data) => data.flowset_id(),
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, FlowSet::Template(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: Header,
    flowsets: Vec<FlowSet>,
}

impl Message {
    pub fn new(header: Header, flowsets: Vec<FlowSet>) -> Self {
        Self { header, flowsets }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn flowsets(&self) -> &[FlowSet] {
        &self.flowsets
    }

    pub fn templates(&self) -> impl Iterator<Item = &TemplateFlowSet> {
        self.flowsets.iter().filter_map(|flowset| match flowset {
            FlowSet::Template(template) => Some(template.as_ref()),
            FlowSet::Data(_) => None,
        })
    }

    pub fn data_flowsets(&self) -> impl Iterator<Item = &DataFlowSet> {
        self.flowsets.iter().filter_map(|flowset| match flowset {
            FlowSet::Data(data) => Some(data),
            FlowSet::Template(_) => None,
        })
    }

    pub fn is_v9(&self) -> bool {
        self.header.version == layout::NETFLOW_V9_VERSION
    }
}
