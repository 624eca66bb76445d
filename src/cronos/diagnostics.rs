//! Collected non-fatal warnings.
//!
//! Cronos files come without a format description, so most mismatches
//! against the observed conventions are reported and decoding continues.
//! Each [`Diagnostic`] is logged through `tracing` when it is pushed and
//! kept in a [`Diagnostics`] list, so callers can tell warnings apart from
//! the hard failures returned as [`CroError`](crate::CroError).

use std::fmt;

use serde::Serialize;

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A tag byte did not match the expected constant.
    FormatAssertion {
        context: String,
        expected: u8,
        found: Option<u8>,
    },
    /// A key occurred twice in one definition blob; the later value was kept.
    DuplicateKey { key: String },
    /// A bank record could not be decoded with its table's field layout.
    RecordDecodeFailure {
        index: u32,
        error: String,
        hex: String,
    },
    /// Anything else worth flagging about a store.
    Anomaly { message: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FormatAssertion {
                context,
                expected,
                found: Some(found),
            } => write!(
                f,
                "expected {} to start with 0x{:02x}, found 0x{:02x}",
                context, expected, found
            ),
            Diagnostic::FormatAssertion {
                context,
                expected,
                found: None,
            } => write!(
                f,
                "expected {} to start with 0x{:02x}, found no data",
                context, expected
            ),
            Diagnostic::DuplicateKey { key } => write!(f, "duplicate key: {}", key),
            Diagnostic::RecordDecodeFailure { index, error, hex } => {
                write!(f, "record broken: {} ({}) -----> {}", index, error, hex)
            }
            Diagnostic::Anomaly { message } => f.write_str(message),
        }
    }
}

/// Ordered list of diagnostics produced by one operation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a `tracing` warning.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    /// Check `data` starts with `expected`, recording a
    /// [`Diagnostic::FormatAssertion`] if it does not.
    ///
    /// Returns true when the tag matched.
    pub fn expect_tag(&mut self, context: &str, expected: u8, data: &[u8]) -> bool {
        let found = data.first().copied();
        if found == Some(expected) {
            return true;
        }
        self.push(Diagnostic::FormatAssertion {
            context: context.to_string(),
            expected,
            found,
        });
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move every diagnostic from `other` into this list without logging them again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
