use std::{collections::HashMap, io::Read, sync::OnceLock};

use log::{debug, warn};

use crate::{
    access_flags::{CLASS_KEYWORDS, INTERFACE_KEYWORDS},
    analysis::{Analyser, AnalysisReport, Outcome},
    attributes::Attributes,
    descriptor::JavaType,
    entities, AccessFlags, Attribute, ByteData, ClassFileError, ClassRef, ConstantPool, Dumper,
    Field, Method, MethodRef, Result, StringDumper,
};

pub const MAGIC: u32 = 0xCAFEBABE;

const MAGIC_OFFSET: usize = 0;
const MINOR_OFFSET: usize = 4;
const MAJOR_OFFSET: usize = 6;
const CONSTANT_POOL_COUNT_OFFSET: usize = 8;
const CONSTANT_POOL_OFFSET: usize = 10;
// Everything after the constant pool moves with the size of the sections before it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

/// Decides how a class file is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Interface,
    Class,
}
impl From<AccessFlags> for ClassKind {
    fn from(access_flags: AccessFlags) -> Self {
        if access_flags.contains(AccessFlags::INTERFACE) {
            ClassKind::Interface
        } else {
            ClassKind::Class
        }
    }
}

/// Absolute offset of every section of a decoded class file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionOffsets {
    pub constant_pool: usize,
    pub access_flags: usize,
    pub this_class: usize,
    pub super_class: usize,
    pub interfaces_count: usize,
    pub interfaces: usize,
    pub fields_count: usize,
    pub fields: usize,
    pub methods_count: usize,
    pub methods: usize,
    pub attributes_count: usize,
    pub attributes: usize,
    /// First byte after the attributes.
    pub end: usize,
}

#[derive(Debug)]
pub struct ClassFile {
    version: Version,
    constant_pool: ConstantPool,
    access_flags: AccessFlags,
    kind: ClassKind,
    this_class: ClassRef,
    super_class: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    attributes: Attributes,
    offsets: SectionOffsets,
    fields_by_name: OnceLock<HashMap<String, usize>>,
    methods_by_name: OnceLock<HashMap<String, usize>>,
}
impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
        Self::decode(ByteData::new(bytes))
    }

    pub fn read(mut r: impl Read) -> Result<ClassFile> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    pub fn decode(data: ByteData<'_>) -> Result<ClassFile> {
        match data.read_u32(MAGIC_OFFSET)? {
            MAGIC => {}
            magic_identifier => {
                return Err(ClassFileError::InvalidMagicIdentifier(magic_identifier))
            }
        }

        let version = Version {
            minor: data.read_u16(MINOR_OFFSET)?,
            major: data.read_u16(MAJOR_OFFSET)?,
        };

        let constant_pool_count = data.read_u16(CONSTANT_POOL_COUNT_OFFSET)?;
        let (constant_pool, constant_pool_length) =
            ConstantPool::parse(data.window(CONSTANT_POOL_OFFSET)?, constant_pool_count)?;

        let access_flags_offset = CONSTANT_POOL_OFFSET + constant_pool_length;
        let this_class_offset = access_flags_offset + 2;
        let super_class_offset = this_class_offset + 2;
        let interfaces_count_offset = super_class_offset + 2;
        let interfaces_offset = interfaces_count_offset + 2;

        let access_flags = AccessFlags::from_bits_truncate(data.read_u16(access_flags_offset)?);

        let interfaces_count = data.read_u16(interfaces_count_offset)?;
        let (interfaces, interfaces_length) = entities::build_sized(
            data.window(interfaces_offset)?,
            interfaces_count as usize,
            2,
            |d| class_ref_at(&constant_pool, d, 0),
        )?;

        let fields_count_offset = interfaces_offset + interfaces_length;
        let fields_offset = fields_count_offset + 2;
        let fields_count = data.read_u16(fields_count_offset)?;
        let (fields, fields_length) = entities::build(
            data.window(fields_offset)?,
            fields_count as usize,
            Field::parse,
        )?;

        let methods_count_offset = fields_offset + fields_length;
        let methods_offset = methods_count_offset + 2;
        let methods_count = data.read_u16(methods_count_offset)?;
        let (methods, methods_length) = entities::build(
            data.window(methods_offset)?,
            methods_count as usize,
            Method::parse,
        )?;

        let attributes_count_offset = methods_offset + methods_length;
        let attributes_offset = attributes_count_offset + 2;
        let attributes_count = data.read_u16(attributes_count_offset)?;
        let (attributes, attributes_length) = entities::build(
            data.window(attributes_offset)?,
            attributes_count as usize,
            Attribute::parse,
        )?;

        let this_class = class_ref_at(&constant_pool, data, this_class_offset)?;
        // Only java/lang/Object has no superclass.
        let super_class = match data.read_u16(super_class_offset)? {
            0 => None,
            _ => Some(class_ref_at(&constant_pool, data, super_class_offset)?),
        };

        let offsets = SectionOffsets {
            constant_pool: CONSTANT_POOL_OFFSET,
            access_flags: access_flags_offset,
            this_class: this_class_offset,
            super_class: super_class_offset,
            interfaces_count: interfaces_count_offset,
            interfaces: interfaces_offset,
            fields_count: fields_count_offset,
            fields: fields_offset,
            methods_count: methods_count_offset,
            methods: methods_offset,
            attributes_count: attributes_count_offset,
            attributes: attributes_offset,
            end: attributes_offset + attributes_length,
        };
        debug!("Decoded class file sections: {:?}", offsets);
        if offsets.end < data.len() {
            debug!(
                "Ignoring {} trailing bytes after offset {}",
                data.len() - offsets.end,
                offsets.end
            );
        }

        Ok(ClassFile {
            version,
            kind: ClassKind::from(access_flags),
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes: Attributes(attributes),
            offsets,
            fields_by_name: OnceLock::new(),
            methods_by_name: OnceLock::new(),
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn this_class(&self) -> ClassRef {
        self.this_class
    }

    pub fn super_class(&self) -> Option<ClassRef> {
        self.super_class
    }

    pub fn interfaces(&self) -> &[ClassRef] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn method_refs(&self) -> impl Iterator<Item = MethodRef<'_>> {
        self.methods.iter().map(move |m| MethodRef::new(self, m))
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn offsets(&self) -> &SectionOffsets {
        &self.offsets
    }

    pub fn class_name(&self) -> Result<&str> {
        self.this_class.name(&self.constant_pool)
    }

    pub fn super_class_name(&self) -> Result<Option<&str>> {
        self.super_class
            .map(|super_class| super_class.name(&self.constant_pool))
            .transpose()
    }

    pub fn field_name(&self, field: &Field) -> Result<&str> {
        field.name(&self.constant_pool)
    }

    pub fn field_descriptor(&self, field: &Field) -> Result<&str> {
        field.descriptor(&self.constant_pool)
    }

    pub fn method_name(&self, method: &Method) -> Result<&str> {
        method.name(&self.constant_pool)
    }

    pub fn method_descriptor(&self, method: &Method) -> Result<&str> {
        method.descriptor(&self.constant_pool)
    }

    /// Looks a field up by simple name. The index is built on first use.
    pub fn field_by_name(&self, name: &str) -> Result<&Field> {
        let index = self
            .fields_by_name
            .get_or_init(|| index_by_name(&self.fields, |f| f.name(&self.constant_pool)));

        index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| ClassFileError::NoSuchField(name.to_owned()))
    }

    /// Looks a method up by simple name. Of several overloads, the last declared wins;
    /// use [`ClassFile::methods_named`] to get all of them.
    pub fn method_by_name(&self, name: &str) -> Result<&Method> {
        let index = self
            .methods_by_name
            .get_or_init(|| index_by_name(&self.methods, |m| m.name(&self.constant_pool)));

        index
            .get(name)
            .map(|&i| &self.methods[i])
            .ok_or_else(|| ClassFileError::NoSuchMethod(name.to_owned()))
    }

    /// Every method with this simple name, in declaration order.
    pub fn methods_named(&self, name: &str) -> Vec<&Method> {
        self.methods
            .iter()
            .filter(|m| matches!(m.name(&self.constant_pool), Ok(n) if n == name))
            .collect()
    }

    /// Runs `analyser` over every method it selects, in declaration order. A failing
    /// method is recorded and the next one analysed.
    pub fn analyse_methods<A: Analyser + ?Sized>(&self, analyser: &A) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        for (i, method) in self.method_refs().enumerate() {
            let name = match method.name() {
                Ok(name) => name.to_owned(),
                Err(e) => {
                    warn!("Exception analysing method #{}: {}", i, e);
                    report.push(format!("<method #{}>", i), Outcome::Failed(e.into()));
                    continue;
                }
            };

            if !analyser.should_analyse(&name) {
                report.push(name, Outcome::Skipped);
                continue;
            }

            match method.analyse(analyser) {
                Ok(()) => report.push(name, Outcome::Analysed),
                Err(cause) => {
                    warn!("Exception analysing {}: {}", name, cause);
                    report.push(name, Outcome::Failed(cause));
                }
            }
        }

        report
    }

    /// Like [`ClassFile::analyse_methods`], failing once every method has been tried
    /// if any of them failed.
    pub fn analyse_all<A: Analyser + ?Sized>(&self, analyser: &A) -> Result<()> {
        Ok(self.analyse_methods(analyser).into_result()?)
    }

    pub fn render(&self, d: &mut dyn Dumper) -> Result<()> {
        match self.kind {
            ClassKind::Interface => self.render_as_interface(d),
            ClassKind::Class => self.render_as_class(d),
        }
    }

    pub fn render_to_string(&self) -> Result<String> {
        let mut d = StringDumper::new();
        self.render(&mut d)?;
        Ok(d.finish())
    }

    fn render_as_interface(&self, d: &mut dyn Dumper) -> Result<()> {
        self.render_imports(d)?;

        d.print(&format!(
            "{}interface {}\n",
            self.access_flags.keywords(INTERFACE_KEYWORDS),
            self.this_class.display_name(&self.constant_pool)?
        ));
        self.render_type_list(d, "extends", &self.interfaces)?;
        d.remove_trailing_soft_break();
        d.print("{\n");

        if !self.methods.is_empty() {
            d.print("// Methods\n");
            for method in self.method_refs() {
                d.print(&format!("{};\n", method.signature_text()?));
            }
        }
        d.print("}\n");
        Ok(())
    }

    fn render_as_class(&self, d: &mut dyn Dumper) -> Result<()> {
        self.render_imports(d)?;

        d.print(&format!(
            "{}class {}\n",
            self.access_flags.keywords(CLASS_KEYWORDS),
            self.this_class.display_name(&self.constant_pool)?
        ));
        if let Some(super_class) = self.super_class {
            d.print(&format!(
                "extends {}\n",
                super_class.display_name(&self.constant_pool)?
            ));
        }
        self.render_type_list(d, "implements", &self.interfaces)?;
        d.remove_trailing_soft_break();
        d.print("{\n");

        if !self.fields.is_empty() {
            d.print("// Fields\n");
            for field in &self.fields {
                field.dump(d, &self.constant_pool)?;
            }
        }
        if !self.methods.is_empty() {
            if !self.fields.is_empty() {
                d.newln();
            }
            d.print("// Methods\n");
            for method in self.method_refs() {
                d.newln();
                method.dump(d)?;
            }
        }
        d.print("}\n");
        Ok(())
    }

    fn render_imports(&self, d: &mut dyn Dumper) -> Result<()> {
        d.print("// Imports\n");
        let referenced = self.referenced_types()?;
        self.constant_pool.emit_imports(d, self.class_name()?, &referenced);
        Ok(())
    }

    /// Types named by the descriptors the rendering prints. Interfaces render no fields.
    fn referenced_types(&self) -> Result<Vec<JavaType>> {
        let mut types = Vec::new();
        if self.kind == ClassKind::Class {
            for field in &self.fields {
                types.push(field.field_type(&self.constant_pool)?);
            }
        }
        for method in &self.methods {
            let descriptor = method.method_descriptor(&self.constant_pool)?;
            types.extend(descriptor.parameters);
            types.push(descriptor.return_type);
        }
        Ok(types)
    }

    /// `keyword A,\nB\n`, or nothing for an empty list.
    fn render_type_list(
        &self,
        d: &mut dyn Dumper,
        keyword: &str,
        types: &[ClassRef],
    ) -> Result<()> {
        if types.is_empty() {
            return Ok(());
        }

        d.print(&format!("{} ", keyword));
        let last = types.len() - 1;
        for (i, class) in types.iter().enumerate() {
            let separator = if i < last { ",\n" } else { "\n" };
            d.print(&format!(
                "{}{}",
                class.display_name(&self.constant_pool)?,
                separator
            ));
        }
        Ok(())
    }
}

/// Resolves the class index stored at `offset`, naming that offset on failure.
fn class_ref_at(
    constant_pool: &ConstantPool,
    data: ByteData<'_>,
    offset: usize,
) -> Result<ClassRef> {
    constant_pool
        .class_ref(data.read_u16(offset)?)
        .map_err(|e| ClassFileError::InvalidClassReference {
            offset: data.base() + offset,
            source: Box::new(e),
        })
}

fn index_by_name<'a, T>(
    records: &'a [T],
    name: impl Fn(&'a T) -> Result<&'a str>,
) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match name(record) {
            Ok(name) => {
                index.insert(name.to_owned(), i);
            }
            Err(e) => warn!("Not indexing record #{} without a name: {}", i, e),
        }
    }
    index
}
