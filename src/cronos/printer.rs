//! Definition printing.

use std::io::Write;

use crate::cronos::definition::Definition;
use crate::util::hex::{str_escape, OutputConfig};
use crate::util::wprintln;
use crate::CroError;

/// Whether every byte is printable text: tab, LF, CR, ASCII 0x20..=0x7e or
/// a CP1251 letter in 0xc0..=0xff.
pub fn is_printable(data: &[u8]) -> bool {
    data.iter()
        .all(|&b| matches!(b, 0x09 | 0x0a | 0x0d | 0x20..=0x7e | 0xc0..=0xff))
}

/// Print one line per definition entry.
///
/// Printable values are shown as a quoted escaped string, anything else is
/// rendered with `config`.
pub fn print_definition(
    writer: &mut dyn Write,
    definition: &Definition,
    config: &OutputConfig,
) -> Result<(), CroError> {
    for (key, value) in definition.iter() {
        if is_printable(value) {
            wprintln!(writer, "{:<20} - \"{}\"", key, str_escape(value))?;
        } else {
            wprintln!(writer, "{:<20} - {}", key, config.render(value))?;
        }
    }
    Ok(())
}
