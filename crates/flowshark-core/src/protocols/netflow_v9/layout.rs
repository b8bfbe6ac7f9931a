pub const HEADER_LEN: usize = 20;

pub const VERSION_RANGE: std::ops::Range<usize> = 0..2;
pub const COUNT_RANGE: std::ops::Range<usize> = 2..4;
pub const SYS_UPTIME_RANGE: std::ops::Range<usize> = 4..8;
pub const UNIX_SECS_RANGE: std::ops::Range<usize> = 8..12;
pub const FLOW_SEQUENCE_RANGE: std::ops::Range<usize> = 12..16;
pub const SOURCE_ID_RANGE: std::ops::Range<usize> = 16..20;

pub const FLOWSET_PREFIX_LEN: usize = 4;
pub const TEMPLATE_FLOWSET_ID: u16 = 0;
pub const TEMPLATE_HEADER_LEN: usize = 4;
pub const TEMPLATE_FIELD_LEN: usize = 4;

pub const NETFLOW_V9_VERSION: u16 = 9;
