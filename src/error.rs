//! Unified error type for the kradix library.
//!
//! Library code uses `KradixError` while CLI code uses `anyhow::Result`
//! for convenience.
//!
//! # Error Categories
//!
//! - **InvalidNucleotide / InvalidIupac**: a byte outside the key or
//!   pattern alphabet, reported at sequence construction
//! - **KeyTooLong**: a key or pattern over the 32-nucleotide limit
//! - **UnsupportedStrategy**: an unrecognized query strategy number
//! - **TreeInvariant**: internal trie inconsistency (unsorted labels,
//!   oversized prefix, page overflow); fatal for the current operation
//! - **CorruptNode**: a node page failed structural validation at read
//! - **Io / Format / Validation**: the persistence and config boundary

use std::fmt;
use std::path::PathBuf;

/// Unified error type for the kradix library.
#[derive(Debug)]
pub enum KradixError {
    /// A byte outside {A,C,G,T} in a key.
    InvalidNucleotide(u8),

    /// A byte outside the 15-letter IUPAC set in a pattern.
    InvalidIupac(u8),

    /// Key or pattern length exceeds the 32-nucleotide limit.
    KeyTooLong(usize),

    /// Query strategy number not in the external contract.
    UnsupportedStrategy(u16),

    /// Internal trie inconsistency. Fatal; the tree is not mutated.
    TreeInvariant(String),

    /// A node page failed structural validation at read.
    CorruptNode(String),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Invalid index file format (magic bytes, version, structure).
    Format { path: PathBuf, detail: String },

    /// Validation error (invalid parameters or options).
    Validation(String),
}

impl fmt::Display for KradixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KradixError::InvalidNucleotide(b) => {
                write!(
                    f,
                    "Invalid nucleotide character '{}' (0x{:02x}): only A, C, G, T are allowed",
                    printable(*b),
                    b
                )
            }
            KradixError::InvalidIupac(b) => {
                write!(
                    f,
                    "Invalid IUPAC code character '{}' (0x{:02x}): only A, C, G, T, R, Y, S, W, K, M, B, D, H, V, N are allowed",
                    printable(*b),
                    b
                )
            }
            KradixError::KeyTooLong(n) => {
                write!(
                    f,
                    "Sequence of length {} exceeds the maximum of {} nucleotides",
                    n,
                    crate::constants::MAX_KMER_LEN
                )
            }
            KradixError::UnsupportedStrategy(n) => {
                write!(f, "Unsupported query strategy number: {}", n)
            }
            KradixError::TreeInvariant(msg) => {
                write!(f, "Tree invariant violated: {}", msg)
            }
            KradixError::CorruptNode(msg) => write!(f, "Corrupt node page: {}", msg),
            KradixError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            KradixError::Format { path, detail } => {
                write!(f, "Invalid format in '{}': {}", path.display(), detail)
            }
            KradixError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for KradixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KradixError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KradixError {
    fn from(err: std::io::Error) -> Self {
        KradixError::Io {
            path: PathBuf::new(),
            operation: "unknown",
            source: err,
        }
    }
}

/// Convenience type alias for Results using KradixError.
pub type Result<T> = std::result::Result<T, KradixError>;

fn printable(b: u8) -> char {
    if b.is_ascii_graphic() {
        b as char
    } else {
        '?'
    }
}

// ============================================================================
// Helper constructors
// ============================================================================

impl KradixError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        KradixError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        KradixError::Format {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        KradixError::Validation(msg.into())
    }

    /// Create a tree-invariant error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        KradixError::TreeInvariant(msg.into())
    }

    /// Create a corrupt-node error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        KradixError::CorruptNode(msg.into())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_nucleotide_display() {
        let err = KradixError::InvalidNucleotide(b'X');
        let msg = err.to_string();
        assert!(msg.contains('X'));
        assert!(msg.contains("0x58"));
    }

    #[test]
    fn test_invalid_nucleotide_nonprintable() {
        let err = KradixError::InvalidNucleotide(0x07);
        let msg = err.to_string();
        assert!(msg.contains('?'));
        assert!(msg.contains("0x07"));
    }

    #[test]
    fn test_invalid_iupac_display() {
        let err = KradixError::InvalidIupac(b'Z');
        assert!(err.to_string().contains('Z'));
    }

    #[test]
    fn test_key_too_long_display() {
        let err = KradixError::KeyTooLong(40);
        let msg = err.to_string();
        assert!(msg.contains("40"));
        assert!(msg.contains("32"));
    }

    #[test]
    fn test_unsupported_strategy_display() {
        let err = KradixError::UnsupportedStrategy(7);
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_io_error_display() {
        let err = KradixError::io(
            "/path/to/index.krdx",
            "read",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/path/to/index.krdx"));
        assert!(msg.contains("read"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_format_error_display() {
        let err = KradixError::format("/path/to/index.krdx", "invalid magic bytes");
        let msg = err.to_string();
        assert!(msg.contains("/path/to/index.krdx"));
        assert!(msg.contains("invalid magic bytes"));
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = KradixError::io("/path", "open", io_err);
        assert!(std::error::Error::source(&err).is_some());

        let err = KradixError::invariant("labels out of order");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: KradixError = io_err.into();

        match err {
            KradixError::Io { operation, .. } => assert_eq!(operation, "unknown"),
            _ => panic!("Expected Io variant"),
        }
    }
}
