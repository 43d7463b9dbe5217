//! Operation vocabulary shared across tracegen crates.

use std::fmt;

/// Kind of request in a trace.
///
/// Discriminants are the numeric codes written to trace files. `Update` is
/// relabeled to `Write` before emission and `Delete` is never produced; both
/// are kept so the vocabulary matches the replay side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationType {
    Read = 0,
    Write = 1,
    Scan = 2,
    Delete = 3,
    Update = 4,
}

impl OperationType {
    /// Numeric code used in the trace line grammar.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            2 => Some(Self::Scan),
            3 => Some(Self::Delete),
            4 => Some(Self::Update),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Scan => "SCAN",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One emitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationType,
    pub key: u64,
    /// Generated payload; only WRITEs carry one, and only with value
    /// generation enabled.
    pub value: Option<String>,
    /// Number of keys covered; non-zero only for SCAN.
    pub scan_length: u64,
}

impl Operation {
    pub fn read(key: u64) -> Self {
        Self { kind: OperationType::Read, key, value: None, scan_length: 0 }
    }

    pub fn write(key: u64, value: Option<String>) -> Self {
        Self { kind: OperationType::Write, key, value, scan_length: 0 }
    }

    pub fn scan(key: u64, scan_length: u64) -> Self {
        Self { kind: OperationType::Scan, key, value: None, scan_length }
    }

    pub fn is_write(&self) -> bool {
        self.kind == OperationType::Write
    }
}
