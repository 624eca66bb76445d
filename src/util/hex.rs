//! Hex dump and string escaping utilities.
//!
//! Helpers for rendering raw record bytes: compact hex strings, traditional
//! hex dumps with offset columns and ASCII sidebars, and escaped strings
//! that keep CP1251 Cyrillic readable. [`OutputConfig`] selects one of these
//! renderings for the dump commands.

use serde::Serialize;

use crate::cronos::reader::decode_cp1251;

/// Format bytes as a compact hex string (e.g., "4a2f00ff").
pub fn format_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Render bytes as ASCII, replacing non-printable bytes with '.'.
pub fn as_ascii(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Escape bytes as a string literal body.
///
/// Printable ASCII and CP1251 letters (`0xC0..=0xFF`) are kept, `\t`, `\n`,
/// `\r`, `\\` and `"` use their usual escapes, everything else becomes
/// `\xNN`.
pub fn str_escape(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(b as char),
            0xc0..=0xff => out.push_str(&decode_cp1251(&[b])),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}

/// Produce a standard hex dump of `data` with the given `base_offset`.
///
/// Output format (16 bytes per line):
/// ```text
/// 00000000  xx xx xx xx xx xx xx xx  xx xx xx xx xx xx xx xx  |................|
/// ```
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    let mut lines = Vec::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        let offset = base_offset + (i * 16) as u64;
        let mut line = format!("{:08x}  ", offset);

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                line.push(' ');
            }
            line.push_str(&format!("{:02x} ", byte));
        }

        // Pad short last line
        for j in chunk.len()..16 {
            if j == 8 {
                line.push(' ');
            }
            line.push_str("   ");
        }

        line.push_str(" |");
        line.push_str(&format!("{:<16}", as_ascii(chunk)));
        line.push('|');

        lines.push(line);
    }

    lines.join("\n")
}

/// How raw bytes are rendered by the dump commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Compact hex string.
    #[default]
    Hex,
    /// Printable ASCII with '.' for everything else.
    Ascii,
    /// Escaped string, see [`str_escape`].
    Escaped,
    /// Multi-line hex dump, starting on a new line.
    Dump,
}

/// Rendering options shared by the dump commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub style: OutputStyle,
    /// Render at most this many bytes, marking the cut with `...`.
    pub width: Option<usize>,
}

impl OutputConfig {
    pub fn render(&self, data: &[u8]) -> String {
        let (shown, cut) = match self.width {
            Some(w) if data.len() > w => (&data[..w], true),
            _ => (data, false),
        };
        let mut out = match self.style {
            OutputStyle::Hex => format_bytes(shown),
            OutputStyle::Ascii => as_ascii(shown),
            OutputStyle::Escaped => str_escape(shown),
            OutputStyle::Dump => format!("\n{}", hex_dump(shown, 0)),
        };
        if cut {
            out.push_str("...");
        }
        out
    }
}
