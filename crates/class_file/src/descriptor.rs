//! Field and method descriptors (§4.3) and the Java names they render as.

use std::fmt;

use crate::{ClassFileError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
    /// A class or interface, by its internal name.
    Object(String),
    Array(Box<JavaType>),
}
impl JavaType {
    /// Parses a field descriptor such as `I` or `[Ljava/lang/String;`.
    pub fn parse(descriptor: &str) -> Result<JavaType> {
        match parse_prefix(descriptor)? {
            (JavaType::Void, _) => Err(invalid(descriptor)),
            (java_type, "") => Ok(java_type),
            _ => Err(invalid(descriptor)),
        }
    }

    /// Internal name of the class this type refers to, looking through arrays.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Object(name) => Some(name),
            JavaType::Array(component) => component.class_name(),
            _ => None,
        }
    }

    /// The fully qualified source name, e.g. `java.lang.String[]`.
    pub fn qualified(&self) -> String {
        match self {
            JavaType::Object(name) => name.replace(|c: char| c == '/' || c == '$', "."),
            JavaType::Array(component) => format!("{}[]", component.qualified()),
            primitive => primitive.to_string(),
        }
    }
}
impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Byte => f.write_str("byte"),
            JavaType::Char => f.write_str("char"),
            JavaType::Double => f.write_str("double"),
            JavaType::Float => f.write_str("float"),
            JavaType::Int => f.write_str("int"),
            JavaType::Long => f.write_str("long"),
            JavaType::Short => f.write_str("short"),
            JavaType::Boolean => f.write_str("boolean"),
            JavaType::Void => f.write_str("void"),
            JavaType::Object(name) => f.write_str(&simple_name(name)),
            JavaType::Array(component) => write!(f, "{}[]", component),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<JavaType>,
    pub return_type: JavaType,
}
impl MethodDescriptor {
    /// Parses a method descriptor such as `(ILjava/lang/String;)V`.
    pub fn parse(descriptor: &str) -> Result<MethodDescriptor> {
        let mut rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| invalid(descriptor))?;

        let mut parameters = Vec::new();
        while let Some(c) = rest.chars().next() {
            if c == ')' {
                break;
            }
            let (parameter, tail) = parse_prefix(rest).map_err(|_| invalid(descriptor))?;
            if parameter == JavaType::Void {
                return Err(invalid(descriptor));
            }
            parameters.push(parameter);
            rest = tail;
        }

        let rest = rest.strip_prefix(')').ok_or_else(|| invalid(descriptor))?;
        let return_type = match parse_prefix(rest) {
            Ok((return_type, "")) => return_type,
            _ => return Err(invalid(descriptor)),
        };

        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

/// Source name of a class given its internal name: `java/util/Map$Entry` becomes
/// `Map.Entry`, array classes such as `[Ljava/lang/Object;` become `Object[]`.
pub fn class_simple_name(internal_name: &str) -> Result<String> {
    if internal_name.starts_with('[') {
        return Ok(JavaType::parse(internal_name)?.to_string());
    }

    Ok(simple_name(internal_name))
}

fn simple_name(internal_name: &str) -> String {
    let name = internal_name
        .rsplit_once('/')
        .map_or(internal_name, |(_, name)| name);

    name.replace('$', ".")
}

fn parse_prefix(descriptor: &str) -> Result<(JavaType, &str)> {
    let mut chars = descriptor.chars();
    let java_type = match chars.next() {
        Some('B') => JavaType::Byte,
        Some('C') => JavaType::Char,
        Some('D') => JavaType::Double,
        Some('F') => JavaType::Float,
        Some('I') => JavaType::Int,
        Some('J') => JavaType::Long,
        Some('S') => JavaType::Short,
        Some('Z') => JavaType::Boolean,
        Some('V') => JavaType::Void,
        Some('L') => {
            let body = chars.as_str();
            let end = body.find(';').ok_or_else(|| invalid(descriptor))?;
            if end == 0 {
                return Err(invalid(descriptor));
            }
            return Ok((JavaType::Object(body[..end].to_owned()), &body[end + 1..]));
        }
        Some('[') => {
            let (component, rest) = parse_prefix(chars.as_str())?;
            if component == JavaType::Void {
                return Err(invalid(descriptor));
            }
            return Ok((JavaType::Array(Box::new(component)), rest));
        }
        _ => return Err(invalid(descriptor)),
    };

    Ok((java_type, chars.as_str()))
}

fn invalid(descriptor: &str) -> ClassFileError {
    ClassFileError::InvalidDescriptor(descriptor.to_owned())
}
