//! Shared utilities (output macros, hex and string formatting, database directory discovery).

pub mod fs;
pub mod hex;

/// Write a line to the given writer, converting io::Error to CroError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::CroError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::CroError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;
