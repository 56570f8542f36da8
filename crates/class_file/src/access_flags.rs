use bitflags::bitflags;

bitflags! {
    /// `access_flags` of a class, field or method. Some bits mean different things
    /// depending on where they appear, hence the aliases.
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

/// Flags that may appear in an interface declaration. `interface` and the implicit
/// `abstract` are never printed.
pub(crate) const INTERFACE_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
];

pub(crate) const CLASS_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::ABSTRACT, "abstract"),
];

pub(crate) const FIELD_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::TRANSIENT, "transient"),
    (AccessFlags::VOLATILE, "volatile"),
];

pub(crate) const METHOD_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::ABSTRACT, "abstract"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::SYNCHRONIZED, "synchronized"),
    (AccessFlags::NATIVE, "native"),
    (AccessFlags::STRICT, "strictfp"),
];

impl AccessFlags {
    /// Keywords of the `eligible` flags that are set, in `eligible` order, each
    /// followed by a space.
    pub fn keywords(self, eligible: &[(AccessFlags, &str)]) -> String {
        eligible
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .fold(String::new(), |mut s, (_, keyword)| {
                s.push_str(keyword);
                s.push(' ');
                s
            })
    }
}
