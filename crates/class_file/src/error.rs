use thiserror::Error;

use crate::{analysis::AnalysisFailed, constant_pool};

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Unexpected end of data at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },
    #[error("Invalid cp info tag {tag} at offset {offset}")]
    InvalidCpInfoTag { tag: u8, offset: usize },
    #[error("Constant pool index {index} out of range (constant_pool_count is {count})")]
    ConstantPoolIndexOutOfRange { index: u16, count: usize },
    #[error("Expected {0}, found {1:?}")]
    UnexpectedConstantPoolEntry(&'static str, constant_pool::CpInfo),
    #[error("Invalid class reference at offset {offset}: {source}")]
    InvalidClassReference {
        offset: usize,
        #[source]
        source: Box<ClassFileError>,
    },
    #[error("Invalid descriptor: {0:?}")]
    InvalidDescriptor(String),
    #[error("No field named {0}")]
    NoSuchField(String),
    #[error("No method named {0}")]
    NoSuchMethod(String),
    #[error(transparent)]
    AnalysisFailed(#[from] AnalysisFailed),
}

/// Coarse classification of a [`ClassFileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    /// Bad magic, truncated data or an undecodable structure. Fatal for the decode.
    MalformedContainer,
    /// A constant pool index that is out of range or of the wrong kind. Fatal for the decode.
    UnresolvedSymbol,
    /// A name lookup miss.
    NotFound,
    /// One or more methods failed to analyse.
    AnalysisFailed,
}

impl ClassFileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IOError(_) => ErrorKind::Io,
            Self::InvalidMagicIdentifier(_)
            | Self::Truncated { .. }
            | Self::InvalidCpInfoTag { .. }
            | Self::InvalidDescriptor(_) => ErrorKind::MalformedContainer,
            Self::ConstantPoolIndexOutOfRange { .. }
            | Self::UnexpectedConstantPoolEntry(..)
            | Self::InvalidClassReference { .. } => ErrorKind::UnresolvedSymbol,
            Self::NoSuchField(_) | Self::NoSuchMethod(_) => ErrorKind::NotFound,
            Self::AnalysisFailed(_) => ErrorKind::AnalysisFailed,
        }
    }
}
