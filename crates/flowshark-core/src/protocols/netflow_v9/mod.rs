//! NetFlow v9 datagram decoding.
//!
//! A datagram is a 20-byte header followed by flowsets. Template flowsets
//! (id 0) declare record layouts; data flowsets carry raw records and are
//! only decodable once the template with the matching id has been seen
//! earlier in the same datagram. Decoding is two-phase: this module slices
//! and pairs bytes, while the `fields` module interprets them on demand.
//!
//! Byte positions live in `layout`, bounds-checked reads in `reader`, and
//! the header/template/data decoders with the dispatch loop in `parser`.

pub mod error;
pub mod fixture;
pub mod layout;
pub mod model;
pub mod parser;
pub mod reader;
pub mod registry;

pub use error::{Diagnostic, FlowSetDefect, NetFlowError, Truncated};
pub use fixture::{
    DatagramBuilder, DecodeCase, FixtureError, FlowSetRecord, FlowSetType, MessageRecord,
    TemplateFieldRecord,
};
pub use model::{DataFlowSet, FlowSet, Header, Message, TemplateField, TemplateFlowSet};
pub use parser::{Decoded, decode_datagram, decode_message};
pub use registry::TemplateRegistry;
