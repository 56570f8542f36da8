#![allow(dead_code)]

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_VARARGS: u16 = 0x0080;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

/// Assembles class files in memory.
pub struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    utf8s: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassBuilder {
    pub fn new(name: &str, access_flags: u16) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            next_index: 1,
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            access_flags,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class(name);
        builder
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&index) = self.utf8s.get(s) {
            return index;
        }
        self.pool.push(1);
        self.pool.extend((s.len() as u16).to_be_bytes());
        self.pool.extend(s.as_bytes());
        let index = self.take_slots(1);
        self.utf8s.insert(s.to_owned(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        self.pool.push(7);
        self.pool.extend(name_index.to_be_bytes());
        let index = self.take_slots(1);
        self.classes.insert(name.to_owned(), index);
        index
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.pool.push(3);
        self.pool.extend(value.to_be_bytes());
        self.take_slots(1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.pool.push(5);
        self.pool.extend(value.to_be_bytes());
        self.take_slots(2)
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let string_index = self.utf8(value);
        self.pool.push(8);
        self.pool.extend(string_index.to_be_bytes());
        self.take_slots(1)
    }

    pub fn super_class(&mut self, name: &str) -> &mut Self {
        self.super_class = self.class(name);
        self
    }

    /// Points the super_class item at an arbitrary constant pool index.
    pub fn super_class_index(&mut self, index: u16) -> &mut Self {
        self.super_class = index;
        self
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    pub fn interface_index(&mut self, index: u16) -> &mut Self {
        self.interfaces.push(index);
        self
    }

    pub fn field(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: &[(&str, Vec<u8>)],
    ) -> &mut Self {
        let record = self.member(access_flags, name, descriptor, attributes);
        self.fields.push(record);
        self
    }

    pub fn method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: &[(&str, Vec<u8>)],
    ) -> &mut Self {
        let record = self.member(access_flags, name, descriptor, attributes);
        self.methods.push(record);
        self
    }

    pub fn attribute(&mut self, name: &str, info: Vec<u8>) -> &mut Self {
        let attribute = self.attribute_bytes(name, &info);
        self.attributes.push(attribute);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 52];
        bytes.extend(self.next_index.to_be_bytes());
        bytes.extend(&self.pool);
        bytes.extend(self.access_flags.to_be_bytes());
        bytes.extend(self.this_class.to_be_bytes());
        bytes.extend(self.super_class.to_be_bytes());
        bytes.extend((self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            bytes.extend(interface.to_be_bytes());
        }
        for records in [&self.fields, &self.methods, &self.attributes] {
            bytes.extend((records.len() as u16).to_be_bytes());
            for record in records {
                bytes.extend(record);
            }
        }
        bytes
    }

    fn member(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: &[(&str, Vec<u8>)],
    ) -> Vec<u8> {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut record = Vec::new();
        record.extend(access_flags.to_be_bytes());
        record.extend(name_index.to_be_bytes());
        record.extend(descriptor_index.to_be_bytes());
        record.extend((attributes.len() as u16).to_be_bytes());
        for (name, info) in attributes {
            let attribute = self.attribute_bytes(name, info);
            record.extend(attribute);
        }
        record
    }

    fn attribute_bytes(&mut self, name: &str, info: &[u8]) -> Vec<u8> {
        let name_index = self.utf8(name);
        let mut attribute = Vec::new();
        attribute.extend(name_index.to_be_bytes());
        attribute.extend((info.len() as u32).to_be_bytes());
        attribute.extend(info);
        attribute
    }

    fn take_slots(&mut self, slots: u16) -> u16 {
        let index = self.next_index;
        self.next_index += slots;
        index
    }
}

/// Body of a `Code` attribute.
pub fn code(max_stack: u16, max_locals: u16, code: &[u8], handlers: &[[u16; 4]]) -> Vec<u8> {
    let mut info = Vec::new();
    info.extend(max_stack.to_be_bytes());
    info.extend(max_locals.to_be_bytes());
    info.extend((code.len() as u32).to_be_bytes());
    info.extend(code);
    info.extend((handlers.len() as u16).to_be_bytes());
    for handler in handlers {
        for value in handler {
            info.extend(value.to_be_bytes());
        }
    }
    info.extend(0u16.to_be_bytes());
    info
}

/// `aload_0; invokespecial #n; return` has the right shape for most tests.
pub fn trivial_code() -> Vec<u8> {
    code(1, 1, &[0x2a, 0xb7, 0x00, 0x01, 0xb1], &[])
}
