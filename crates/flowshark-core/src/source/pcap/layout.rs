/// Initial buffer handed to the pcap-parser readers.
pub const PCAP_READER_BUFFER_SIZE: usize = 65_536;

pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

pub const BLOCK_TYPE_SECTION_HEADER: u32 = 0x0a0d_0d0a;
pub const BLOCK_TYPE_INTERFACE_DESCRIPTION: u32 = 0x0000_0001;
pub const BLOCK_TYPE_ENHANCED_PACKET: u32 = 0x0000_0006;
pub const BYTE_ORDER_MAGIC: u32 = 0x1a2b_3c4d;
pub const PCAPNG_VERSION: (u16, u16) = (1, 0);
/// Section length value meaning "not specified".
pub const SECTION_LENGTH_UNSPECIFIED: i64 = -1;

/// Block type and total length before the body, total length after it.
pub const BLOCK_FRAMING_LEN: usize = 12;
pub const BLOCK_ALIGNMENT: usize = 4;

pub const WRITER_SNAPLEN: u32 = 65_535;
pub const LINKTYPE_ETHERNET: u16 = 1;

pub const FRAME_SOURCE_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
pub const FRAME_DESTINATION_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02];
pub const FRAME_TTL: u8 = 64;
