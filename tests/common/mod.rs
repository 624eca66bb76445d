//! Synthetic Cronos store builders shared by the integration tests.
#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

enum Slot {
    Deleted,
    Plain(Vec<u8>),
    Chained(Vec<u8>),
    Raw { offset: u64, size: u32 },
}

/// Builds a `.dat`/`.tad` image pair.
pub struct StoreBuilder {
    version: &'static str,
    encoding: u16,
    block_size: u16,
    slots: Vec<Slot>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder {
            version: "01.02",
            encoding: 0,
            block_size: 0,
            slots: Vec::new(),
        }
    }

    /// Use a version with 64-bit offsets.
    pub fn wide(mut self) -> Self {
        self.version = "01.11";
        self
    }

    pub fn encoding(mut self, encoding: u16) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn block_size(mut self, block_size: u16) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn record(mut self, data: &[u8]) -> Self {
        self.slots.push(Slot::Plain(data.to_vec()));
        self
    }

    pub fn deleted(mut self) -> Self {
        self.slots.push(Slot::Deleted);
        self
    }

    /// A record stored as an extent chain.
    pub fn chained(mut self, data: &[u8]) -> Self {
        self.slots.push(Slot::Chained(data.to_vec()));
        self
    }

    /// A record whose index entry is written verbatim.
    pub fn raw_entry(mut self, offset: u64, size: u32) -> Self {
        self.slots.push(Slot::Raw { offset, size });
        self
    }

    fn is_wide(&self) -> bool {
        !matches!(self.version, "01.02" | "01.03" | "01.04")
    }

    pub fn build(&self) -> (Vec<u8>, Vec<u8>) {
        let wide = self.is_wide();
        let ptr_size = if wide { 8 } else { 4 };
        let block_size = if self.block_size == 0 {
            64
        } else {
            self.block_size as usize
        };

        let mut dat = Vec::new();
        dat.extend_from_slice(b"CroFile\0");
        dat.write_u16::<LittleEndian>(0).unwrap();
        dat.extend_from_slice(self.version.as_bytes());
        dat.write_u16::<LittleEndian>(self.encoding).unwrap();
        dat.write_u16::<LittleEndian>(self.block_size).unwrap();

        let mut entries: Vec<(u64, u32)> = Vec::new();
        for slot in &self.slots {
            match slot {
                Slot::Deleted => entries.push((0, 0xFFFF_FFFF)),
                Slot::Raw { offset, size } => entries.push((*offset, *size)),
                Slot::Plain(data) => {
                    entries.push((dat.len() as u64, 0x1000_0000 | data.len() as u32));
                    dat.extend_from_slice(data);
                }
                Slot::Chained(data) => {
                    // First chunk: next pointer, total length, first piece.
                    let first_piece = data.len().min(8);
                    let offset = dat.len() as u64;
                    let pointer_at = dat.len();
                    write_pointer(&mut dat, 0, ptr_size);
                    dat.write_u32::<LittleEndian>(data.len() as u32).unwrap();
                    dat.extend_from_slice(&data[..first_piece]);
                    let first_len = dat.len() as u64 - offset;
                    entries.push((offset, first_len as u32));

                    let mut rest = &data[first_piece..];
                    let mut prev_pointer = pointer_at;
                    while !rest.is_empty() {
                        let block_start = dat.len();
                        patch_pointer(&mut dat, prev_pointer, block_start as u64, ptr_size);
                        prev_pointer = block_start;
                        write_pointer(&mut dat, 0, ptr_size);
                        let take = rest.len().min(block_size - ptr_size);
                        dat.extend_from_slice(&rest[..take]);
                        dat.resize(block_start + block_size, 0);
                        rest = &rest[take..];
                    }
                }
            }
        }

        let mut tad = Vec::new();
        if wide {
            tad.write_u32::<LittleEndian>(0).unwrap();
        }
        let deleted = self
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Deleted))
            .count() as u32;
        tad.write_u32::<LittleEndian>(deleted).unwrap();
        tad.write_u32::<LittleEndian>(0).unwrap();
        if wide {
            tad.write_u32::<LittleEndian>(0).unwrap();
        }
        for (offset, size) in entries {
            if wide {
                tad.write_u64::<LittleEndian>(offset).unwrap();
            } else {
                tad.write_u32::<LittleEndian>(offset as u32).unwrap();
            }
            tad.write_u32::<LittleEndian>(size).unwrap();
            tad.write_u32::<LittleEndian>(0).unwrap();
        }

        (dat, tad)
    }

    /// Write `<stem>.dat` and `<stem>.tad` into `dir`.
    pub fn write(&self, dir: &Path, stem: &str) {
        let (dat, tad) = self.build();
        std::fs::write(dir.join(format!("{}.dat", stem)), dat).unwrap();
        std::fs::write(dir.join(format!("{}.tad", stem)), tad).unwrap();
    }
}

fn write_pointer(buf: &mut Vec<u8>, value: u64, ptr_size: usize) {
    if ptr_size == 8 {
        buf.write_u64::<LittleEndian>(value).unwrap();
    } else {
        buf.write_u32::<LittleEndian>(value as u32).unwrap();
    }
}

fn patch_pointer(buf: &mut [u8], at: usize, value: u64, ptr_size: usize) {
    if ptr_size == 8 {
        LittleEndian::write_u64(&mut buf[at..], value);
    } else {
        LittleEndian::write_u32(&mut buf[at..], value as u32);
    }
}

/// Frame `data` as a compressed record payload.
pub fn compressed(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    let stream = enc.finish().unwrap();

    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.extend_from_slice(&stream);
    out.extend_from_slice(&[0x00, 0x00, 0x02]);
    out
}

/// Appends key/descriptor entries to a definition blob.
pub struct DefinitionBuilder {
    blob: Vec<u8>,
}

impl DefinitionBuilder {
    /// Start a blob, optionally with a leading tag byte.
    pub fn new(tag: Option<u8>) -> Self {
        DefinitionBuilder {
            blob: tag.into_iter().collect(),
        }
    }

    pub fn inline(mut self, key: &str, value: &[u8]) -> Self {
        self.key(key);
        self.blob
            .write_u32::<LittleEndian>(0x8000_0000 | value.len() as u32)
            .unwrap();
        self.blob.extend_from_slice(value);
        self
    }

    pub fn reference(mut self, key: &str, record: u32) -> Self {
        self.key(key);
        self.blob.write_u32::<LittleEndian>(record).unwrap();
        self
    }

    fn key(&mut self, key: &str) {
        self.blob.push(key.len() as u8);
        self.blob.extend_from_slice(key.as_bytes());
    }

    pub fn build(self) -> Vec<u8> {
        self.blob
    }
}

/// A field definition as stored inside a table definition.
pub fn field(field_type: u16, index: u32, name: &str) -> Vec<u8> {
    let mut f = Vec::new();
    f.write_u16::<LittleEndian>(field_type).unwrap();
    f.write_u32::<LittleEndian>(index).unwrap();
    f.push(name.len() as u8);
    f.extend_from_slice(name.as_bytes());
    f.write_u32::<LittleEndian>(0).unwrap();
    f
}

/// A version 1 table definition blob.
pub fn table(table_id: u32, name: &str, abbreviation: &str, fields: &[Vec<u8>]) -> Vec<u8> {
    let mut b = Vec::new();
    b.write_u16::<LittleEndian>(0).unwrap();
    b.push(1); // version
    b.push(5);
    b.push(0);
    b.write_u32::<LittleEndian>(0).unwrap();
    b.write_u32::<LittleEndian>(table_id).unwrap();
    b.push(name.len() as u8);
    b.extend_from_slice(name.as_bytes());
    b.push(abbreviation.len() as u8);
    b.extend_from_slice(abbreviation.as_bytes());
    b.write_u32::<LittleEndian>(0).unwrap();
    b.write_u32::<LittleEndian>(fields.len() as u32).unwrap();
    for f in fields {
        b.write_u16::<LittleEndian>(f.len() as u16).unwrap();
        b.extend_from_slice(f);
    }
    b
}

/// Write a small but complete database into `dir`:
///
/// - `CroStru`: record 1 is the database definition, record 2 holds the
///   referenced `Base002` table definition.
/// - `CroBank`: `People` rows (table 1), `Places` rows (table 2) and two
///   stored files (table 0), with a deleted slot in between.
pub fn write_sample_database(dir: &Path) {
    let people = table(
        1,
        "People",
        "PE",
        &[field(0, 1, "ID"), field(1, 2, "Name"), field(1, 3, "City")],
    );
    let places = table(2, "Places", "PL", &[field(1, 1, "Place")]);
    let files = table(0, "Files", "FI", &[]);

    let definition = DefinitionBuilder::new(Some(0x03))
        .inline("Bankname", b"Sample")
        .inline("Version", b"3.1")
        .inline("Base000", &files)
        .inline("Base001", &people)
        .reference("Base002", 2)
        .inline("BankId", &[0x00, 0x01, 0x02, 0xff])
        .build();
    let mut referenced = vec![0x04];
    referenced.extend_from_slice(&places);

    StoreBuilder::new()
        .record(&definition)
        .record(&referenced)
        .write(dir, "CroStru");

    StoreBuilder::new()
        .record(b"\x011\x1eIvan\x1eTver")
        .record(b"\x00first file")
        .deleted()
        .record(b"\x02Moscow")
        .record(b"\x012\x1eOlga\x1eOmsk")
        .record(b"\x00\x89PNG")
        .write(dir, "CroBank");
}
