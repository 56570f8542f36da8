use std::fmt;

use crate::{
    access_flags::METHOD_KEYWORDS,
    analysis::Analyser,
    attributes::{Attributes, CodeAttribute},
    descriptor::{JavaType, MethodDescriptor},
    parser::Parser,
    AccessFlags, BoxError, ByteData, ClassFile, ConstantPool, Dumper, Result,
};

#[derive(Debug)]
pub struct Method {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl Method {
    /// Parses one `method_info` structure, returning it with its size in bytes.
    pub fn parse(data: ByteData<'_>) -> Result<(Method, usize)> {
        let mut parser = Parser::new(data);
        let method = parser.parse_method_info()?;
        Ok((method, parser.position()))
    }

    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.descriptor_index)
    }

    pub fn method_descriptor(&self, constant_pool: &ConstantPool) -> Result<MethodDescriptor> {
        MethodDescriptor::parse(self.descriptor(constant_pool)?)
    }
}

/// A method together with the class that declares it.
///
/// This is how a method reaches the constant pool of its class: the view borrows
/// both, so it cannot outlive the decoded class.
#[derive(Clone, Copy)]
pub struct MethodRef<'a> {
    class: &'a ClassFile,
    method: &'a Method,
}
impl<'a> MethodRef<'a> {
    pub(crate) fn new(class: &'a ClassFile, method: &'a Method) -> Self {
        Self { class, method }
    }

    pub fn class(&self) -> &'a ClassFile {
        self.class
    }

    pub fn method(&self) -> &'a Method {
        self.method
    }

    pub fn name(&self) -> Result<&'a str> {
        self.method.name(self.class.constant_pool())
    }

    pub fn code(&self) -> Result<Option<CodeAttribute>> {
        self.method
            .attributes
            .code_attribute(self.class.constant_pool())
    }

    pub fn signature_text(&self) -> Result<String> {
        let constant_pool = self.class.constant_pool();
        let name = self.name()?;
        if name == "<clinit>" {
            return Ok("static".to_owned());
        }

        let descriptor = self.method.method_descriptor(constant_pool)?;
        let mut text = self.method.access_flags.keywords(METHOD_KEYWORDS);
        if name == "<init>" {
            text.push_str(&self.class.this_class().display_name(constant_pool)?);
        } else {
            text.push_str(&format!("{} {}", descriptor.return_type, name));
        }

        let varargs = self.method.access_flags.contains(AccessFlags::VARARGS);
        let last = descriptor.parameters.len().saturating_sub(1);
        let parameters = descriptor
            .parameters
            .iter()
            .enumerate()
            .map(|(i, parameter)| match parameter {
                JavaType::Array(component) if varargs && i == last => {
                    format!("{}... arg{}", component, i)
                }
                _ => format!("{} arg{}", parameter, i),
            })
            .collect::<Vec<_>>();
        text.push_str(&format!("({})", parameters.join(", ")));

        let exceptions = self
            .method
            .attributes
            .exception_indices(constant_pool)?
            .into_iter()
            .map(|index| constant_pool.class_ref(index)?.display_name(constant_pool))
            .collect::<Result<Vec<_>>>()?;
        if !exceptions.is_empty() {
            text.push_str(&format!(" throws {}", exceptions.join(", ")));
        }

        Ok(text)
    }

    /// Prints the signature, followed by a summary of the code if the method has any.
    pub fn dump(&self, d: &mut dyn Dumper) -> Result<()> {
        let signature = self.signature_text()?;
        let summary = match self.code() {
            Ok(None) => {
                d.print(&format!("{};\n", signature));
                return Ok(());
            }
            Ok(Some(code)) => format!(
                "// max_stack: {}, max_locals: {}, {} bytes of code, {} exception handlers",
                code.max_stack,
                code.max_locals,
                code.code.len(),
                code.exception_table.len()
            ),
            Err(e) => format!("// Unable to read code: {}", e),
        };

        d.print(&format!("{}\n{{\n", signature));
        d.print(&format!("{}\n", summary));
        d.print("}\n");
        Ok(())
    }

    /// Hands the method's code to `analyser`. Methods without code have nothing to
    /// analyse.
    pub fn analyse<A: Analyser + ?Sized>(&self, analyser: &A) -> Result<(), BoxError> {
        match self.code()? {
            Some(code) => analyser.analyse(*self, &code),
            None => Ok(()),
        }
    }
}
impl fmt::Debug for MethodRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRef")
            .field("method", &self.method)
            .finish()
    }
}
