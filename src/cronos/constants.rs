/// Cronos store and record layout constants.
///
/// None of these come from a published format description. They are the
/// conventions observed across real `Cro*.dat`/`Cro*.tad` files.
// .dat header (19 bytes total)
pub const DAT_MAGIC: &[u8; 8] = b"CroFile\0";
pub const DAT_HEADER_SIZE: usize = 19;
pub const DAT_MAGIC_OFFSET: usize = 0; // 8 bytes - "CroFile\0"
pub const DAT_UNKNOWN_OFFSET: usize = 8; // 2 bytes - always small, meaning unknown
pub const DAT_VERSION_OFFSET: usize = 10; // 5 bytes - ASCII version, e.g. "01.02"
pub const DAT_VERSION_LEN: usize = 5;
pub const DAT_ENCODING_OFFSET: usize = 15; // 2 bytes - encoding kind
pub const DAT_BLOCKSIZE_OFFSET: usize = 17; // 2 bytes - extent block size

/// Block size used when the header stores zero.
pub const DEFAULT_BLOCK_SIZE: u16 = 64;

// Encoding values
pub const ENCODING_PLAIN: u16 = 0;
pub const ENCODING_KOD: u16 = 1;
pub const ENCODING_ENCRYPTED: u16 = 3;

// .tad index
pub const TAD_HEADER_SIZE_32: usize = 8; // deleted count + first deleted
pub const TAD_ENTRY_SIZE_32: usize = 12; // offset u32 + size u32 + checksum u32
pub const TAD_HEADER_SIZE_64: usize = 16; // unknown + deleted count + first deleted + unknown
pub const TAD_ENTRY_SIZE_64: usize = 16; // offset u64 + size u32 + checksum u32

/// Versions whose `.tad` entries use 32-bit offsets.
pub const VERSIONS_32BIT: [&str; 3] = ["01.02", "01.03", "01.04"];

/// `.tad` size value marking a deleted or never-written slot.
pub const TAD_SIZE_DELETED: u32 = 0xFFFF_FFFF;
/// Mask for the byte length in a `.tad` size value.
pub const TAD_SIZE_MASK: u32 = 0x0FFF_FFFF;
/// Shift for the flag nibble in a `.tad` size value. Zero flags mean an extent chain.
pub const TAD_FLAGS_SHIFT: u32 = 28;

// Compressed record framing
pub const COMPRESSED_TRAILER: [u8; 3] = [0x00, 0x00, 0x02];
pub const COMPRESSED_HEADER_SIZE: usize = 8; // uncompressed size u32 + unknown u32
pub const COMPRESSED_MIN_LEN: usize = 11;

// Definition blobs
/// Leading tag of the database definition in structure record #1.
pub const TAG_DATABASE_DEFINITION: u8 = 0x03;
/// Leading tag of a record referenced from a definition blob.
pub const TAG_REFERENCED_VALUE: u8 = 0x04;
/// Bit 31 of a definition descriptor: set for inline values.
pub const DESCRIPTOR_INLINE_FLAG: u32 = 0x8000_0000;
pub const DESCRIPTOR_VALUE_MASK: u32 = 0x7FFF_FFFF;
/// Record number of the database definition in the structure store.
pub const DATABASE_DEFINITION_RECORD: u32 = 1;

// Table keys in the database definition
pub const TABLE_KEY_PREFIX: &str = "Base";
/// Numeric suffix of the file/BLOB-storage table.
pub const FILE_TABLE_SUFFIX: &str = "000";

// Bank record payload markers
/// Separates field values in a row payload.
pub const FIELD_SEPARATOR: u8 = 0x1e;
/// Introduces a length-prefixed complex field value.
pub const COMPLEX_FIELD_MARKER: u8 = 0x1b;
/// Sub-value separator seen inside some field values.
pub const SUBFIELD_SEPARATOR: u8 = 0x1d;

/// Consecutive per-record failures after which a raw sweep gives up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;
