//! Cronos record store I/O.
//!
//! Every Cronos store is a pair of files: `Cro<Name>.dat` holds a 19-byte
//! header followed by record payloads, and `Cro<Name>.tad` holds the record
//! index, one fixed-size entry per record number. [`Datafile`] opens such a
//! pair and turns a 1-based record number into the decoded payload bytes,
//! following extent chains, undoing KOD substitution when a table is
//! installed, and inflating compressed payloads.
//!
//! The [`RecordStore`] trait is the narrow interface the decoders and
//! sweeps are written against.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::cronos::compression;
use crate::cronos::constants::*;
use crate::cronos::diagnostics::{Diagnostic, Diagnostics};
use crate::cronos::kod::KodTable;
use crate::CroError;

/// Supertrait combining `Read + Seek` for type-erased readers.
pub(crate) trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Sequential access to the records of one store.
pub trait RecordStore {
    /// Return the decoded payload of record `index` (1-based), or `None`
    /// when the slot is deleted or was never written.
    ///
    /// Fails with [`CroError::OutOfRange`] when `index` is zero or beyond
    /// [`RecordStore::record_count`].
    fn read_record(&mut self, index: u32) -> Result<Option<Vec<u8>>, CroError>;

    /// Number of record slots in the store.
    fn record_count(&self) -> u32;

    /// How record payloads are encoded on disk.
    fn encoding_kind(&self) -> EncodingKind;
}

/// Payload encoding announced in the `.dat` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    Plain,
    /// Byte substitution with a KOD table (see [`crate::cronos::kod`]).
    Kod,
    /// Password protected; payloads cannot be decoded.
    Encrypted,
    Other(u16),
}

impl EncodingKind {
    pub fn from_u16(value: u16) -> Self {
        match value {
            ENCODING_PLAIN => EncodingKind::Plain,
            ENCODING_KOD => EncodingKind::Kod,
            ENCODING_ENCRYPTED => EncodingKind::Encrypted,
            other => EncodingKind::Other(other),
        }
    }

    pub fn name(&self) -> String {
        match self {
            EncodingKind::Plain => "plain".to_string(),
            EncodingKind::Kod => "kod".to_string(),
            EncodingKind::Encrypted => "encrypted".to_string(),
            EncodingKind::Other(v) => format!("unknown ({})", v),
        }
    }

    /// Payloads are KOD-substituted: encoding bit 0 set and not encrypted.
    pub fn is_kod_coded(&self) -> bool {
        match self {
            EncodingKind::Kod => true,
            EncodingKind::Other(v) => v & ENCODING_KOD != 0,
            EncodingKind::Plain | EncodingKind::Encrypted => false,
        }
    }
}

/// Parsed 19-byte `.dat` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatHeader {
    pub magic_ok: bool,
    pub unknown: u16,
    pub version: String,
    pub encoding: EncodingKind,
    pub block_size: u16,
}

impl DatHeader {
    /// Parse the header from the start of a `.dat` file.
    ///
    /// Returns None if fewer than 19 bytes are available.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < DAT_HEADER_SIZE {
            return None;
        }
        let version_bytes =
            &data[DAT_VERSION_OFFSET..DAT_VERSION_OFFSET + DAT_VERSION_LEN];
        let block_size = LittleEndian::read_u16(&data[DAT_BLOCKSIZE_OFFSET..]);
        Some(DatHeader {
            magic_ok: &data[DAT_MAGIC_OFFSET..DAT_MAGIC_OFFSET + DAT_MAGIC.len()] == DAT_MAGIC,
            unknown: LittleEndian::read_u16(&data[DAT_UNKNOWN_OFFSET..]),
            version: String::from_utf8_lossy(version_bytes).to_string(),
            encoding: EncodingKind::from_u16(LittleEndian::read_u16(&data[DAT_ENCODING_OFFSET..])),
            block_size: if block_size == 0 {
                DEFAULT_BLOCK_SIZE
            } else {
                block_size
            },
        })
    }

    /// Whether this version uses 64-bit offsets in `.tad` entries and extent pointers.
    pub fn is_64bit(&self) -> bool {
        !VERSIONS_32BIT.contains(&self.version.as_str())
    }
}

/// One `.tad` index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TadEntry {
    pub offset: u64,
    pub size: u32,
    pub checksum: u32,
}

impl TadEntry {
    pub fn is_deleted(&self) -> bool {
        self.size == TAD_SIZE_DELETED
    }

    /// Flag nibble; zero means the record is stored as an extent chain.
    pub fn flags(&self) -> u32 {
        self.size >> TAD_FLAGS_SHIFT
    }

    pub fn length(&self) -> u32 {
        self.size & TAD_SIZE_MASK
    }
}

/// Summary of an open store, for display.
#[derive(Debug, Clone, Serialize)]
pub struct DatafileInfo {
    pub name: String,
    pub version: String,
    pub encoding: EncodingKind,
    pub block_size: u16,
    pub offsets_64bit: bool,
    pub record_count: u32,
    pub deleted_count: u32,
    pub first_deleted: u32,
    pub dat_size: u64,
}

/// An open Cronos store (`.dat` + `.tad` pair).
pub struct Datafile {
    name: String,
    reader: Box<dyn ReadSeek>,
    dat_size: u64,
    header: DatHeader,
    deleted_count: u32,
    first_deleted: u32,
    entries: Vec<TadEntry>,
    kod: Option<KodTable>,
    diagnostics: Diagnostics,
}

impl Datafile {
    /// Open a store from its `.dat` and `.tad` paths.
    pub fn open<P: AsRef<std::path::Path>>(name: &str, dat_path: P, tad_path: P) -> Result<Self, CroError> {
        let dat_path = dat_path.as_ref();
        let file = std::fs::File::open(dat_path)
            .map_err(|e| CroError::Io(format!("Cannot open {}: {}", dat_path.display(), e)))?;
        let dat_size = file
            .metadata()
            .map_err(|e| CroError::Io(format!("Cannot stat {}: {}", dat_path.display(), e)))?
            .len();
        let tad = read_tad(tad_path.as_ref())?;

        Self::init(name, Box::new(file), dat_size, &tad)
    }

    /// Open a store with the `.dat` file memory-mapped.
    ///
    /// # Safety
    ///
    /// The mapping is only sound while no other process modifies the file.
    /// Stores are inspected offline, so this holds in practice.
    #[cfg(feature = "cli")]
    pub fn open_mmap<P: AsRef<std::path::Path>>(name: &str, dat_path: P, tad_path: P) -> Result<Self, CroError> {
        let dat_path = dat_path.as_ref();
        let file = std::fs::File::open(dat_path)
            .map_err(|e| CroError::Io(format!("Cannot open {}: {}", dat_path.display(), e)))?;
        let mmap = unsafe {
            memmap2::Mmap::map(&file)
                .map_err(|e| CroError::Io(format!("Cannot mmap {}: {}", dat_path.display(), e)))?
        };
        let dat_size = mmap.len() as u64;
        let tad = read_tad(tad_path.as_ref())?;

        Self::init(name, Box::new(Cursor::new(mmap)), dat_size, &tad)
    }

    /// Create a store from in-memory `.dat` and `.tad` images.
    ///
    /// # Examples
    ///
    /// ```
    /// use cro::cronos::datafile::{Datafile, RecordStore};
    ///
    /// let mut dat = b"CroFile\0\x00\x0001.02\x00\x00\x00\x00".to_vec();
    /// let offset = dat.len() as u32;
    /// dat.extend_from_slice(b"\x01hello");
    ///
    /// let mut tad = vec![0u8; 8];
    /// tad.extend_from_slice(&offset.to_le_bytes());
    /// tad.extend_from_slice(&(0x1000_0000u32 | 6).to_le_bytes());
    /// tad.extend_from_slice(&0u32.to_le_bytes());
    ///
    /// let mut store = Datafile::from_bytes("Bank", dat, tad).unwrap();
    /// assert_eq!(store.record_count(), 1);
    /// assert_eq!(store.read_record(1).unwrap(), Some(b"\x01hello".to_vec()));
    /// ```
    pub fn from_bytes(name: &str, dat: Vec<u8>, tad: Vec<u8>) -> Result<Self, CroError> {
        let dat_size = dat.len() as u64;
        Self::init(name, Box::new(Cursor::new(dat)), dat_size, &tad)
    }

    /// Shared initialization: parse the `.dat` header and the `.tad` index.
    fn init(
        name: &str,
        mut reader: Box<dyn ReadSeek>,
        dat_size: u64,
        tad: &[u8],
    ) -> Result<Self, CroError> {
        if dat_size < DAT_HEADER_SIZE as u64 {
            return Err(CroError::Parse(format!(
                "Cro{}.dat too small to hold a header: {} bytes",
                name, dat_size
            )));
        }

        let mut buf = [0u8; DAT_HEADER_SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(|e| CroError::Io(format!("Cannot read Cro{}.dat header: {}", name, e)))?;
        let header = DatHeader::parse(&buf).ok_or_else(|| {
            CroError::Parse(format!("Cannot parse Cro{}.dat header", name))
        })?;

        let mut diagnostics = Diagnostics::new();
        if !header.magic_ok {
            diagnostics.push(Diagnostic::Anomaly {
                message: format!("Cro{}.dat: unknown magic {:02x?}", name, &buf[..DAT_MAGIC.len()]),
            });
        }

        let (deleted_count, first_deleted, entries) =
            parse_tad(tad, header.is_64bit(), name, &mut diagnostics)?;

        tracing::debug!(
            "opened Cro{}: version {}, encoding {}, {} records",
            name,
            header.version,
            header.encoding.name(),
            entries.len()
        );

        Ok(Datafile {
            name: name.to_string(),
            reader,
            dat_size,
            header,
            deleted_count,
            first_deleted,
            entries,
            kod: None,
            diagnostics,
        })
    }

    /// Store name without the `Cro` prefix (e.g. `Bank`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &DatHeader {
        &self.header
    }

    pub fn dat_size(&self) -> u64 {
        self.dat_size
    }

    /// The `.tad` entry for record `index`, if it exists.
    pub fn entry(&self, index: u32) -> Option<&TadEntry> {
        if index == 0 {
            return None;
        }
        self.entries.get(index as usize - 1)
    }

    /// Warnings raised while opening the store.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Install a KOD table for decoding payloads of KOD-encoded stores.
    pub fn set_kod_table(&mut self, kod: KodTable) {
        self.kod = Some(kod);
    }

    pub fn info(&self) -> DatafileInfo {
        DatafileInfo {
            name: self.name.clone(),
            version: self.header.version.clone(),
            encoding: self.header.encoding,
            block_size: self.header.block_size,
            offsets_64bit: self.header.is_64bit(),
            record_count: self.record_count(),
            deleted_count: self.deleted_count,
            first_deleted: self.first_deleted,
            dat_size: self.dat_size,
        }
    }

    /// Read `len` bytes of the `.dat` file at `offset`.
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, CroError> {
        let end = offset.checked_add(len as u64).unwrap_or(u64::MAX);
        if end > self.dat_size {
            return Err(CroError::Io(format!(
                "Cro{}.dat: {} bytes at offset {} extend past end of file ({} bytes)",
                self.name, len, offset, self.dat_size
            )));
        }

        let mut buf = vec![0u8; len];
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| CroError::Io(format!("Cannot seek to offset {}: {}", offset, e)))?;
        self.reader
            .read_exact(&mut buf)
            .map_err(|e| CroError::Io(format!("Cannot read {} bytes at offset {}: {}", len, offset, e)))?;
        Ok(buf)
    }

    /// Follow the extent chain of a record whose first chunk is `first`.
    ///
    /// The first chunk starts with the next extent offset and the total
    /// record length; every further block of `block_size` bytes starts with
    /// the offset of the block after it.
    fn read_chain(&mut self, index: u32, first: &[u8]) -> Result<Vec<u8>, CroError> {
        let ptr_size = if self.header.is_64bit() { 8 } else { 4 };
        let block_size = self.header.block_size as usize;
        if first.len() < ptr_size + 4 {
            return Err(CroError::Parse(format!(
                "Record {}: extent header needs {} bytes, chunk has {}",
                index,
                ptr_size + 4,
                first.len()
            )));
        }
        if block_size <= ptr_size {
            return Err(CroError::Parse(format!(
                "Cro{}.dat: block size {} cannot hold an extent pointer",
                self.name, block_size
            )));
        }

        let mut next = read_pointer(first, ptr_size);
        let total = LittleEndian::read_u32(&first[ptr_size..]) as usize;
        if total as u64 > self.dat_size {
            return Err(CroError::Parse(format!(
                "Record {}: extent chain claims {} bytes, larger than the .dat file",
                index, total
            )));
        }

        let mut data = first[ptr_size + 4..].to_vec();
        while data.len() < total {
            if next == 0 {
                return Err(CroError::Parse(format!(
                    "Record {}: extent chain ends after {} of {} bytes",
                    index,
                    data.len(),
                    total
                )));
            }
            let block = self.read_at(next, block_size)?;
            next = read_pointer(&block, ptr_size);
            data.extend_from_slice(&block[ptr_size..]);
        }
        data.truncate(total);
        Ok(data)
    }
}

impl RecordStore for Datafile {
    fn read_record(&mut self, index: u32) -> Result<Option<Vec<u8>>, CroError> {
        let entry = match self.entry(index) {
            Some(e) => *e,
            None => {
                return Err(CroError::OutOfRange {
                    index,
                    count: self.record_count(),
                })
            }
        };

        if entry.is_deleted() {
            return Ok(None);
        }
        if entry.length() == 0 {
            return Ok(Some(Vec::new()));
        }

        let chunk = self.read_at(entry.offset, entry.length() as usize)?;
        let mut data = if entry.flags() == 0 {
            self.read_chain(index, &chunk)?
        } else {
            chunk
        };

        if self.header.encoding.is_kod_coded() {
            if let Some(ref kod) = self.kod {
                kod.decode(index, &mut data);
            }
        }

        if compression::is_compressed(&data) {
            data = compression::decompress_record(&data)?;
        }

        Ok(Some(data))
    }

    fn record_count(&self) -> u32 {
        self.entries.len() as u32
    }

    fn encoding_kind(&self) -> EncodingKind {
        self.header.encoding
    }
}

fn read_pointer(data: &[u8], ptr_size: usize) -> u64 {
    if ptr_size == 8 {
        LittleEndian::read_u64(data)
    } else {
        LittleEndian::read_u32(data) as u64
    }
}

fn read_tad(path: &std::path::Path) -> Result<Vec<u8>, CroError> {
    std::fs::read(path).map_err(|e| CroError::Io(format!("Cannot read {}: {}", path.display(), e)))
}

/// Parse a `.tad` image into (deleted count, first deleted, entries).
fn parse_tad(
    tad: &[u8],
    wide: bool,
    name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(u32, u32, Vec<TadEntry>), CroError> {
    let (header_size, entry_size) = if wide {
        (TAD_HEADER_SIZE_64, TAD_ENTRY_SIZE_64)
    } else {
        (TAD_HEADER_SIZE_32, TAD_ENTRY_SIZE_32)
    };

    if tad.len() < header_size {
        return Err(CroError::Parse(format!(
            "Cro{}.tad too small to hold a header: {} bytes",
            name,
            tad.len()
        )));
    }

    let (deleted_count, first_deleted) = if wide {
        (
            LittleEndian::read_u32(&tad[4..]),
            LittleEndian::read_u32(&tad[8..]),
        )
    } else {
        (LittleEndian::read_u32(&tad[0..]), LittleEndian::read_u32(&tad[4..]))
    };

    let body = &tad[header_size..];
    if body.len() % entry_size != 0 {
        diagnostics.push(Diagnostic::Anomaly {
            message: format!(
                "Cro{}.tad: {} trailing bytes after the last index entry",
                name,
                body.len() % entry_size
            ),
        });
    }

    let entries = body
        .chunks_exact(entry_size)
        .map(|e| {
            if wide {
                TadEntry {
                    offset: LittleEndian::read_u64(&e[0..]),
                    size: LittleEndian::read_u32(&e[8..]),
                    checksum: LittleEndian::read_u32(&e[12..]),
                }
            } else {
                TadEntry {
                    offset: LittleEndian::read_u32(&e[0..]) as u64,
                    size: LittleEndian::read_u32(&e[4..]),
                    checksum: LittleEndian::read_u32(&e[8..]),
                }
            }
        })
        .collect();

    Ok((deleted_count, first_deleted, entries))
}
