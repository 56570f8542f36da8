use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    descriptor::{self, JavaType},
    parser::Parser,
    ByteData, ClassFileError, Dumper, Result,
};

#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.entry($index) {
            Ok($crate::CpInfo::$i(n)) => Ok(n),
            Ok(c) => Err($crate::ClassFileError::UnexpectedConstantPoolEntry(
                stringify!($i),
                c.clone(),
            )),
            Err(e) => Err(e),
        }
    };
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    cp_infos: Vec<CpInfo>,
    resolutions: AtomicUsize,
}
impl ConstantPool {
    pub fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self {
            cp_infos,
            resolutions: AtomicUsize::new(0),
        }
    }

    /// Parses the `constant_pool_count - 1` slots of a pool, returning it with the
    /// number of bytes it occupies.
    pub fn parse(data: ByteData<'_>, constant_pool_count: u16) -> Result<(Self, usize)> {
        let mut parser = Parser::new(data);

        let mut count = (constant_pool_count as usize).saturating_sub(1);
        let mut res = Vec::with_capacity(count);
        while count > 0 {
            let (cp_info, slot_size) = parser.parse_cp_info()?;
            res.push(cp_info);
            (1..slot_size).for_each(|_| res.push(CpInfo::Unusable));

            count = count.saturating_sub(slot_size);
        }

        Ok((Self::new(res), parser.position()))
    }

    /// Number of slots, including the unusable halves of longs and doubles.
    pub fn len(&self) -> usize {
        self.cp_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cp_infos.is_empty()
    }

    /// Looks up the entry at a 1-based `index`.
    pub fn entry(&self, index: u16) -> Result<&CpInfo> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        match self.slot(index) {
            Some(CpInfo::Unusable) => Err(ClassFileError::UnexpectedConstantPoolEntry(
                "usable entry",
                CpInfo::Unusable,
            )),
            Some(cp_info) => Ok(cp_info),
            None => Err(ClassFileError::ConstantPoolIndexOutOfRange {
                index,
                count: self.cp_infos.len() + 1,
            }),
        }
    }

    /// How many times [`ConstantPool::entry`] has been called.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        matches_cp_info!(self, index, Utf8).map(String::as_str)
    }

    pub fn class(&self, index: u16) -> Result<&ClassInfo> {
        matches_cp_info!(self, index, Class)
    }

    pub fn class_ref(&self, index: u16) -> Result<ClassRef> {
        let ClassInfo { name_index } = self.class(index)?;

        Ok(ClassRef {
            index,
            name_index: *name_index,
        })
    }

    /// Prints an import for every class the pool or `referenced` refers to, except
    /// primitives, `java.lang` and the package of `this_class`. Array types import
    /// their element class.
    pub fn emit_imports(&self, d: &mut dyn Dumper, this_class: &str, referenced: &[JavaType]) {
        let own_package = package_of(this_class);
        let pool_classes = self.cp_infos.iter().filter_map(|cp_info| match cp_info {
            CpInfo::Class(ClassInfo { name_index }) => match self.slot(*name_index) {
                Some(CpInfo::Utf8(name)) => class_of(name),
                _ => None,
            },
            _ => None,
        });
        let descriptor_classes = referenced
            .iter()
            .filter_map(|java_type| java_type.class_name().map(str::to_owned));

        let imports = pool_classes
            .chain(descriptor_classes)
            .filter(|name| package_of(name) != own_package)
            .filter_map(|name| import_name(&name))
            .collect::<BTreeSet<_>>();

        for import in &imports {
            d.print(&format!("import {};\n", import));
        }
        if !imports.is_empty() {
            d.newln();
        }
    }

    fn slot(&self, index: u16) -> Option<&CpInfo> {
        self.cp_infos.get((index as usize).checked_sub(1)?)
    }
}
fn package_of(internal_name: &str) -> Option<&str> {
    internal_name.rsplit_once('/').map(|(package, _)| package)
}

/// Class named by a `CONSTANT_Class` entry, which may be an array descriptor.
fn class_of(internal_name: &str) -> Option<String> {
    if internal_name.starts_with('[') {
        let java_type = JavaType::parse(internal_name).ok()?;
        return java_type.class_name().map(str::to_owned);
    }
    Some(internal_name.to_owned())
}

fn import_name(internal_name: &str) -> Option<String> {
    let (package, class) = internal_name.rsplit_once('/')?;
    if package == "java/lang" {
        return None;
    }
    let outer = class.split('$').next().unwrap_or(class);

    Some(format!("{}.{}", package.replace('/', "."), outer))
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    MethodRef(RefInfo),
    FieldRef(RefInfo),
    Float(f32),
    Double(f64),
    InterfaceMethodRef(RefInfo),
    Class(ClassInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(String),
    String { string_index: u16 },
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Integer(i32),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Long(i64),
    Module { name_index: u16 },
    Package { name_index: u16 },
    Unusable,
}

/// A `CONSTANT_Class_info` entry, resolved from its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRef {
    pub index: u16,
    pub name_index: u16,
}
impl ClassRef {
    /// The binary name in internal form, e.g. `java/lang/Object`.
    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.name_index)
    }

    /// The name as it appears in source, e.g. `Object` or `String[]`.
    pub fn display_name(&self, constant_pool: &ConstantPool) -> Result<String> {
        descriptor::class_simple_name(self.name(constant_pool)?)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // The value of the name_index item must be a valid index into the constant_pool table.
    // The constant_pool entry at that index must be a CONSTANT_Utf8_info structure (§4.4.7)
    // representing a valid binary class or interface name encoded in internal form (§4.2.1).
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}
