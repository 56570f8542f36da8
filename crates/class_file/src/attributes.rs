use crate::{parser::Parser, Attribute, ConstantPool, Result};

#[derive(Debug, Default)]
pub struct Attributes(pub Vec<Attribute>);
impl Attributes {
    pub fn find_by_name(&self, name: &str, constant_pool: &ConstantPool) -> Option<&Attribute> {
        self.0
            .iter()
            .find(|a| matches!(a.name(constant_pool), Ok(s) if s == name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn code_attribute(&self, constant_pool: &ConstantPool) -> Result<Option<CodeAttribute>> {
        let Some(attribute) = self.find_by_name("Code", constant_pool) else {
            return Ok(None);
        };

        Parser::new(attribute.data())
            .parse_code_attribute()
            .map(Some)
    }

    /// The `constantvalue_index` of a field's `ConstantValue` attribute.
    pub fn constant_value_index(&self, constant_pool: &ConstantPool) -> Result<Option<u16>> {
        let Some(attribute) = self.find_by_name("ConstantValue", constant_pool) else {
            return Ok(None);
        };

        Parser::new(attribute.data()).read_u16().map(Some)
    }

    /// Class indices listed by a method's `Exceptions` attribute.
    pub fn exception_indices(&self, constant_pool: &ConstantPool) -> Result<Vec<u16>> {
        let Some(attribute) = self.find_by_name("Exceptions", constant_pool) else {
            return Ok(Vec::new());
        };

        let mut parser = Parser::new(attribute.data());
        let number_of_exceptions = parser.read_u16()?;
        (0..number_of_exceptions)
            .map(|_| parser.read_u16())
            .collect()
    }
}

#[derive(Debug)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Attributes,
}
