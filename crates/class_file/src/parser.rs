use crate::{
    attributes::{Attributes, CodeAttribute, ExceptionTableEntry},
    constant_pool::{
        ClassInfo, CpInfo, DynamicInfo, MethodHandleInfo, MethodTypeInfo, NameAndTypeInfo,
        RefInfo,
    },
    AccessFlags, Attribute, ByteData, ClassFileError, Field, Method, Result,
};

/// Cursor over a window, used to read the records whose size is only known once
/// they have been read.
pub(crate) struct Parser<'a> {
    data: ByteData<'a>,
    position: usize,
}
impl<'a> Parser<'a> {
    pub(crate) fn new(data: ByteData<'a>) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn parse_field_info(&mut self) -> Result<Field> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;
        let attributes_count = self.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        Ok(Field {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub(crate) fn parse_method_info(&mut self) -> Result<Method> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;
        let attributes_count = self.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        Ok(Method {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub(crate) fn parse_cp_info(&mut self) -> Result<(CpInfo, usize)> {
        let offset = self.data.base() + self.position;
        let tag = self.read_u8()?;
        let (cp_info, slot_size) = match tag {
            1 => (self.parse_utf8()?, 1),
            3 => (CpInfo::Integer(self.read_i32()?), 1),
            4 => (CpInfo::Float(f32::from_bits(self.read_u32()?)), 1),
            5 => (CpInfo::Long(self.read_u64()? as i64), 2),
            6 => (CpInfo::Double(f64::from_bits(self.read_u64()?)), 2),
            7 => (self.parse_class_info()?, 1),
            8 => (self.parse_string()?, 1),
            9 => (CpInfo::FieldRef(self.parse_ref_info()?), 1),
            10 => (CpInfo::MethodRef(self.parse_ref_info()?), 1),
            11 => (CpInfo::InterfaceMethodRef(self.parse_ref_info()?), 1),
            12 => (self.parse_name_and_type_info()?, 1),
            15 => (self.parse_method_handle()?, 1),
            16 => (self.parse_method_type_info()?, 1),
            17 => (CpInfo::Dynamic(self.parse_dynamic_info()?), 1),
            18 => (CpInfo::InvokeDynamic(self.parse_dynamic_info()?), 1),
            19 => (
                CpInfo::Module {
                    name_index: self.read_u16()?,
                },
                1,
            ),
            20 => (
                CpInfo::Package {
                    name_index: self.read_u16()?,
                },
                1,
            ),
            _ => return Err(ClassFileError::InvalidCpInfoTag { tag, offset }),
        };

        Ok((cp_info, slot_size))
    }

    fn parse_utf8(&mut self) -> Result<CpInfo> {
        let length = self.read_u16()?;
        let bytes = self.read_bytes(length as usize)?;

        Ok(CpInfo::Utf8(String::from_utf8_lossy(bytes).into()))
    }

    fn parse_class_info(&mut self) -> Result<CpInfo> {
        let name_index = self.read_u16()?;

        Ok(CpInfo::Class(ClassInfo { name_index }))
    }

    fn parse_string(&mut self) -> Result<CpInfo> {
        let string_index = self.read_u16()?;

        Ok(CpInfo::String { string_index })
    }

    fn parse_name_and_type_info(&mut self) -> Result<CpInfo> {
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;

        Ok(CpInfo::NameAndType(NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    fn parse_method_handle(&mut self) -> Result<CpInfo> {
        let reference_kind = self.read_u8()?;
        let reference_index = self.read_u16()?;

        Ok(CpInfo::MethodHandle(MethodHandleInfo {
            reference_kind,
            reference_index,
        }))
    }

    fn parse_method_type_info(&mut self) -> Result<CpInfo> {
        let descriptor_index = self.read_u16()?;

        Ok(CpInfo::MethodType(MethodTypeInfo { descriptor_index }))
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    pub(crate) fn parse_attribute(&mut self) -> Result<Attribute> {
        let attribute_name_index = self.read_u16()?;
        let attribute_length = self.read_u32()?;
        let info_offset = self.data.base() + self.position;
        let info = self.read_bytes(attribute_length as usize)?.to_vec();

        Ok(Attribute {
            attribute_name_index,
            info_offset,
            info,
        })
    }

    pub(crate) fn parse_code_attribute(&mut self) -> Result<CodeAttribute> {
        let max_stack = self.read_u16()?;
        let max_locals = self.read_u16()?;
        let code_length = self.read_u32()?;
        let code = self.read_bytes(code_length as usize)?.to_vec();
        let exception_table_length = self.read_u16()?;
        let exception_table = (0..exception_table_length)
            .map(|_| self.parse_exception_table_entry())
            .collect::<Result<Vec<_>>>()?;
        let attributes_count = self.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn parse_exception_table_entry(&mut self) -> Result<ExceptionTableEntry> {
        let start_pc = self.read_u16()?;
        let end_pc = self.read_u16()?;
        let handler_pc = self.read_u16()?;
        let catch_type = self.read_u16()?;

        Ok(ExceptionTableEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }

    pub(crate) fn parse_attributes(&mut self, attributes_count: u16) -> Result<Attributes> {
        (0..attributes_count)
            .map(|_| self.parse_attribute())
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.data.bytes(self.position, len)?;
        self.position += len;
        Ok(bytes)
    }

    fn read_u64(&mut self) -> Result<u64> {
        let high_bytes = self.read_u32()?;
        let low_bytes = self.read_u32()?;

        Ok((high_bytes as u64) << 32 | low_bytes as u64)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let value = self.data.read_u32(self.position)?;
        self.position += 4;
        Ok(value)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let value = self.data.read_u16(self.position)?;
        self.position += 2;
        Ok(value)
    }

    fn read_u8(&mut self) -> Result<u8> {
        let value = self.data.read_u8(self.position)?;
        self.position += 1;
        Ok(value)
    }

    fn read_i32(&mut self) -> Result<i32> {
        let value = self.data.read_i32(self.position)?;
        self.position += 4;
        Ok(value)
    }
}
