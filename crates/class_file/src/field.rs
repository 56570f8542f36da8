use crate::{
    access_flags::FIELD_KEYWORDS,
    attributes::Attributes,
    descriptor::JavaType,
    parser::Parser,
    AccessFlags, ByteData, ClassFileError, ConstantPool, CpInfo, Dumper, Result,
};

#[derive(Debug)]
pub struct Field {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl Field {
    /// Parses one `field_info` structure, returning it with its size in bytes.
    pub fn parse(data: ByteData<'_>) -> Result<(Field, usize)> {
        let mut parser = Parser::new(data);
        let field = parser.parse_field_info()?;
        Ok((field, parser.position()))
    }

    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.descriptor_index)
    }

    pub fn field_type(&self, constant_pool: &ConstantPool) -> Result<JavaType> {
        JavaType::parse(self.descriptor(constant_pool)?)
    }

    pub fn dump(&self, d: &mut dyn Dumper, constant_pool: &ConstantPool) -> Result<()> {
        let field_type = self.field_type(constant_pool)?;
        let mut text = format!(
            "{}{} {}",
            self.access_flags.keywords(FIELD_KEYWORDS),
            field_type,
            self.name(constant_pool)?
        );
        if let Some(index) = self.attributes.constant_value_index(constant_pool)? {
            text.push_str(" = ");
            text.push_str(&constant_text(constant_pool, index, &field_type)?);
        }
        text.push_str(";\n");

        d.print(&text);
        Ok(())
    }
}

/// Java literal for the value of a `ConstantValue` attribute.
fn constant_text(
    constant_pool: &ConstantPool,
    index: u16,
    field_type: &JavaType,
) -> Result<String> {
    let text = match constant_pool.entry(index)? {
        CpInfo::Integer(i) => match field_type {
            JavaType::Boolean => (*i != 0).to_string(),
            JavaType::Char => match u16::try_from(*i) {
                Ok(unit) => char_literal(unit),
                Err(_) => i.to_string(),
            },
            _ => i.to_string(),
        },
        CpInfo::Long(l) => format!("{}L", l),
        CpInfo::Float(f) if f.is_nan() => "Float.NaN".to_owned(),
        CpInfo::Float(f) if f.is_infinite() => {
            let sign = if *f > 0. { "POSITIVE" } else { "NEGATIVE" };
            format!("Float.{}_INFINITY", sign)
        }
        CpInfo::Float(f) => format!("{:?}F", f),
        CpInfo::Double(v) if v.is_nan() => "Double.NaN".to_owned(),
        CpInfo::Double(v) if v.is_infinite() => {
            let sign = if *v > 0. { "POSITIVE" } else { "NEGATIVE" };
            format!("Double.{}_INFINITY", sign)
        }
        CpInfo::Double(v) => format!("{:?}", v),
        CpInfo::String { string_index } => {
            let mut literal = String::from('"');
            for c in constant_pool.utf8(*string_index)?.chars() {
                push_escaped(&mut literal, c, '"');
            }
            literal.push('"');
            literal
        }
        c => {
            return Err(ClassFileError::UnexpectedConstantPoolEntry(
                "constant value",
                c.clone(),
            ))
        }
    };

    Ok(text)
}

/// A Java `char` literal for one UTF-16 code unit.
fn char_literal(unit: u16) -> String {
    let mut literal = String::from('\'');
    match char::from_u32(unit as u32) {
        Some(c) => push_escaped(&mut literal, c, '\''),
        None => literal.push_str(&format!("\\u{:04x}", unit)),
    }
    literal.push('\'');
    literal
}

/// Appends `c` as it would appear inside a Java literal delimited by `quote`.
fn push_escaped(literal: &mut String, c: char, quote: char) {
    match c {
        '\\' => literal.push_str("\\\\"),
        '\n' => literal.push_str("\\n"),
        '\t' => literal.push_str("\\t"),
        '\r' => literal.push_str("\\r"),
        '\u{8}' => literal.push_str("\\b"),
        '\u{c}' => literal.push_str("\\f"),
        c if c == quote => {
            literal.push('\\');
            literal.push(c);
        }
        c if c.is_control() => literal.push_str(&format!("\\u{:04x}", c as u32)),
        c => literal.push(c),
    }
}
