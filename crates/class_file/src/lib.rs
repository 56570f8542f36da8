// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html

mod access_flags;
pub mod analysis;
pub mod attributes;
mod bytes;
mod class_file;
#[macro_use]
mod constant_pool;
pub mod descriptor;
mod dumper;
pub mod entities;
mod error;
mod field;
mod method;
mod parser;

use std::fmt;

pub use self::class_file::{ClassFile, ClassKind, SectionOffsets, Version, MAGIC};
pub use access_flags::AccessFlags;
pub use analysis::{AnalysisFailed, AnalysisOptions, AnalysisReport, Analyser};
pub use bytes::ByteData;
pub use constant_pool::{ClassRef, ConstantPool, CpInfo};
pub use dumper::{Dumper, StringDumper, WriteDumper};
pub use error::{ClassFileError, ErrorKind};
pub use field::Field;
pub use method::{Method, MethodRef};

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;

/// Error type produced by method analysers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct Attribute {
    pub attribute_name_index: u16,
    /// Absolute container offset of the first byte of `info`.
    pub info_offset: usize,
    pub info: Vec<u8>,
}
impl Attribute {
    /// Parses one `attribute_info` structure, returning it with its total size in bytes.
    pub fn parse(data: ByteData<'_>) -> Result<(Attribute, usize)> {
        let mut parser = parser::Parser::new(data);
        let attribute = parser.parse_attribute()?;
        Ok((attribute, parser.position()))
    }

    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.attribute_name_index)
    }

    pub(crate) fn data(&self) -> ByteData<'_> {
        ByteData::at(&self.info, self.info_offset)
    }
}
impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("attribute_name_index", &self.attribute_name_index)
            .field("info", &format!("({} bytes)", self.info.len()))
            .finish()
    }
}
