mod common;

use std::cell::RefCell;

use common::*;
use decaf_class_file::{
    analysis::Outcome, attributes::CodeAttribute, AccessFlags, AnalysisOptions, Analyser,
    BoxError, ClassFile, ClassFileError, ClassKind, ErrorKind, MethodRef,
};

fn my_class() -> Vec<u8> {
    ClassBuilder::new("my/MyClass", ACC_PUBLIC | ACC_SUPER)
        .super_class("java/lang/Object")
        .field(ACC_PRIVATE | ACC_FINAL, "myField", "I", &[])
        .method(ACC_PUBLIC, "<init>", "()V", &[("Code", trivial_code())])
        .method(ACC_PUBLIC, "add", "(I)F", &[("Code", trivial_code())])
        .build()
}

fn with_class_file(f: impl FnOnce(ClassFile)) {
    let _ = pretty_env_logger::try_init();
    f(ClassFile::parse(&my_class()).unwrap());
}

fn foo() -> Vec<u8> {
    ClassBuilder::new("Foo", ACC_PUBLIC | ACC_FINAL | ACC_SUPER)
        .super_class("java/lang/Object")
        .method(ACC_PUBLIC, "bar", "()V", &[("Code", trivial_code())])
        .build()
}

fn shape() -> Vec<u8> {
    ClassBuilder::new("com/example/Shape", ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
        .super_class("java/lang/Object")
        .interface("java/lang/Comparable")
        .interface("java/io/Serializable")
        .field(ACC_PUBLIC | ACC_STATIC | ACC_FINAL, "SIDES", "I", &[])
        .method(ACC_PUBLIC | ACC_ABSTRACT, "area", "()D", &[])
        .method(ACC_PUBLIC | ACC_ABSTRACT, "name", "()Ljava/lang/String;", &[])
        .build()
}

fn base() -> Vec<u8> {
    let mut builder =
        ClassBuilder::new("com/example/Base", ACC_PUBLIC | ACC_ABSTRACT | ACC_SUPER);
    let count = builder.integer(3);
    let io_exception = builder.class("java/io/IOException");
    builder
        .super_class("com/example/Parent")
        .interface("java/lang/Runnable")
        .interface("java/util/RandomAccess")
        .field(
            ACC_PRIVATE | ACC_STATIC | ACC_FINAL,
            "COUNT",
            "I",
            &[("ConstantValue", count.to_be_bytes().to_vec())],
        )
        .field(ACC_PROTECTED, "items", "Ljava/util/List;", &[])
        .method(ACC_PUBLIC, "<init>", "()V", &[("Code", trivial_code())])
        .method(ACC_PUBLIC | ACC_ABSTRACT, "run", "()V", &[])
        .method(
            ACC_PUBLIC | ACC_STATIC | ACC_VARARGS,
            "sum",
            "([I)J",
            &[
                ("Code", code(4, 2, &[0x09, 0xad], &[])),
                ("Exceptions", [1u16, io_exception].map(u16::to_be_bytes).concat()),
            ],
        )
        .attribute("SourceFile", 1u16.to_be_bytes().to_vec());
    builder.build()
}

#[test]
fn test_super_class() {
    with_class_file(|class_file| {
        assert_eq!(Some("java/lang/Object"), class_file.super_class_name().unwrap())
    });
}

#[test]
fn test_class_name() {
    with_class_file(|class_file| assert_eq!("my/MyClass", class_file.class_name().unwrap()));
}

#[test]
fn test_field_name() {
    with_class_file(|class_file| {
        assert_eq!(
            "myField",
            class_file.field_name(&class_file.fields()[0]).unwrap()
        )
    });
}

#[test]
fn test_int_field_type() {
    with_class_file(|class_file| {
        assert_eq!(
            "I",
            class_file.field_descriptor(&class_file.fields()[0]).unwrap()
        )
    });
}

#[test]
fn test_field_access_flags() {
    with_class_file(|class_file| {
        assert_eq!(
            AccessFlags::FINAL | AccessFlags::PRIVATE,
            class_file.fields()[0].access_flags
        )
    });
}

#[test]
fn test_constructor_name() {
    with_class_file(|class_file| {
        assert_eq!(
            "<init>",
            class_file.method_name(&class_file.methods()[0]).unwrap()
        )
    });
}

#[test]
fn test_constructor_descriptor() {
    with_class_file(|class_file| {
        assert_eq!(
            "()V",
            class_file
                .method_descriptor(&class_file.methods()[0])
                .unwrap()
        )
    });
}

#[test]
fn test_method_name() {
    with_class_file(|class_file| {
        assert_eq!(
            "add",
            class_file.method_name(&class_file.methods()[1]).unwrap()
        )
    });
}

#[test]
fn test_method_descriptor() {
    with_class_file(|class_file| {
        assert_eq!(
            "(I)F",
            class_file
                .method_descriptor(&class_file.methods()[1])
                .unwrap()
        )
    });
}

#[test]
fn test_method_access_flags() {
    with_class_file(|class_file| {
        assert_eq!(AccessFlags::PUBLIC, class_file.methods()[1].access_flags)
    });
}

#[test]
fn test_offsets_cover_the_whole_container() {
    let bytes = base();
    let class_file = ClassFile::parse(&bytes).unwrap();
    let offsets = class_file.offsets();

    assert_eq!(offsets.fields_count, offsets.interfaces + 2 * 2);
    assert!(offsets.fields < offsets.methods_count);
    assert!(offsets.methods < offsets.attributes_count);
    assert_eq!(offsets.end, bytes.len());
    assert_eq!(class_file.attributes().len(), 1);
}

#[test]
fn test_fields_follow_an_empty_interface_table() {
    let class_file = ClassFile::parse(&foo()).unwrap();
    let offsets = class_file.offsets();

    assert!(class_file.interfaces().is_empty());
    assert_eq!(offsets.fields_count, offsets.interfaces);
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut bytes = foo();
    let len = bytes.len();
    bytes.extend([0xde, 0xad, 0x00]);

    let class_file = ClassFile::parse(&bytes).unwrap();

    assert_eq!(class_file.offsets().end, len);
}

#[test]
fn test_bad_magic_is_a_malformed_container() {
    let mut bytes = foo();
    bytes[0] = 0;

    let error = ClassFile::parse(&bytes).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::MalformedContainer);
}

#[test]
fn test_truncated_method_table_is_a_malformed_container() {
    let bytes = foo();

    let error = ClassFile::parse(&bytes[..bytes.len() - 4]).unwrap_err();

    assert!(matches!(error, ClassFileError::Truncated { .. }));
    assert_eq!(error.kind(), ErrorKind::MalformedContainer);
}

#[test]
fn test_absent_superclass() {
    let bytes = ClassBuilder::new("java/lang/Object", ACC_PUBLIC | ACC_SUPER)
        .super_class_index(0)
        .build();

    let class_file = ClassFile::parse(&bytes).unwrap();

    assert_eq!(class_file.super_class(), None);
    assert_eq!(class_file.super_class_name().unwrap(), None);
}

#[test]
fn test_superclass_out_of_range_is_unresolved() {
    let bytes = ClassBuilder::new("Foo", ACC_PUBLIC | ACC_SUPER)
        .super_class_index(999)
        .build();

    let error = ClassFile::parse(&bytes).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnresolvedSymbol);
    match error {
        ClassFileError::InvalidClassReference { offset, source } => {
            assert_eq!(u16_at(&bytes, offset), 999);
            assert!(matches!(
                *source,
                ClassFileError::ConstantPoolIndexOutOfRange { index: 999, .. }
            ));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_interface_of_the_wrong_kind_is_unresolved() {
    let mut builder = ClassBuilder::new("Foo", ACC_PUBLIC | ACC_SUPER);
    let not_a_class = builder.utf8("java/lang/Runnable");
    builder
        .super_class("java/lang/Object")
        .interface_index(not_a_class);

    let bytes = builder.build();

    let error = ClassFile::parse(&bytes).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnresolvedSymbol);
    match error {
        ClassFileError::InvalidClassReference { offset, source } => {
            assert_eq!(u16_at(&bytes, offset), not_a_class);
            assert!(matches!(
                *source,
                ClassFileError::UnexpectedConstantPoolEntry("Class", _)
            ));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

#[test]
fn test_method_lookup_resolves_names_once() {
    let class_file = ClassFile::parse(&base()).unwrap();

    let first = class_file.method_by_name("sum").unwrap();
    let resolutions = class_file.constant_pool().resolution_count();
    let second = class_file.method_by_name("sum").unwrap();

    assert!(std::ptr::eq(first, second));
    assert_eq!(class_file.constant_pool().resolution_count(), resolutions);
}

#[test]
fn test_field_lookup() {
    let class_file = ClassFile::parse(&base()).unwrap();

    let field = class_file.field_by_name("items").unwrap();

    assert_eq!(
        class_file.field_descriptor(field).unwrap(),
        "Ljava/util/List;"
    );
}

#[test]
fn test_lookup_misses_are_not_found() {
    let class_file = ClassFile::parse(&foo()).unwrap();

    let method = class_file.method_by_name("baz").unwrap_err();
    let field = class_file.field_by_name("baz").unwrap_err();

    assert!(matches!(method, ClassFileError::NoSuchMethod(ref name) if name == "baz"));
    assert!(matches!(field, ClassFileError::NoSuchField(ref name) if name == "baz"));
    assert_eq!(method.kind(), ErrorKind::NotFound);
    assert_eq!(field.kind(), ErrorKind::NotFound);
}

#[test]
fn test_last_overload_wins_the_lookup() {
    let bytes = ClassBuilder::new("Foo", ACC_PUBLIC | ACC_SUPER)
        .super_class("java/lang/Object")
        .method(ACC_PUBLIC, "bar", "()V", &[("Code", trivial_code())])
        .method(ACC_PUBLIC, "bar", "(I)V", &[("Code", trivial_code())])
        .build();
    let class_file = ClassFile::parse(&bytes).unwrap();

    let bar = class_file.method_by_name("bar").unwrap();

    assert_eq!(class_file.method_descriptor(bar).unwrap(), "(I)V");
    assert_eq!(class_file.methods().len(), 2);
    assert_eq!(class_file.methods_named("bar").len(), 2);
}

#[test]
fn test_last_field_wins_the_lookup() {
    let bytes = ClassBuilder::new("Foo", ACC_PUBLIC | ACC_SUPER)
        .super_class("java/lang/Object")
        .field(ACC_PRIVATE, "value", "I", &[])
        .field(ACC_PRIVATE, "value", "J", &[])
        .build();
    let class_file = ClassFile::parse(&bytes).unwrap();

    let value = class_file.field_by_name("value").unwrap();

    assert_eq!(class_file.field_descriptor(value).unwrap(), "J");
    assert_eq!(class_file.fields().len(), 2);
}

#[test]
fn test_render_imports_types_from_descriptors() {
    let bytes = ClassBuilder::new("com/example/Holder", ACC_PUBLIC | ACC_SUPER)
        .super_class("java/lang/Object")
        .field(ACC_PRIVATE, "items", "Ljava/util/List;", &[])
        .method(ACC_PUBLIC | ACC_ABSTRACT, "map", "()Ljava/util/Map;", &[])
        .method(
            ACC_PUBLIC | ACC_ABSTRACT,
            "since",
            "([Ljava/time/Instant;Lcom/example/Clock;)Ljava/lang/String;",
            &[],
        )
        .build();
    let class_file = ClassFile::parse(&bytes).unwrap();

    let text = class_file.render_to_string().unwrap();

    assert!(text.starts_with(
        "// Imports\n\
         import java.time.Instant;\n\
         import java.util.List;\n\
         import java.util.Map;\n\
         \n\
         public class Holder\n"
    ));
    assert!(text.contains("    private List items;\n"));
    assert!(text.contains("    public abstract Map map();\n"));
    assert!(text.contains("    public abstract String since(Instant[] arg0, Clock arg1);\n"));
}

#[test]
fn test_render_class() {
    let class_file = ClassFile::parse(&foo()).unwrap();

    assert_eq!(class_file.kind(), ClassKind::Class);
    assert_eq!(
        class_file.render_to_string().unwrap(),
        "// Imports\n\
         public final class Foo\n\
         extends Object\n\
         {\n    \
             // Methods\n\
         \n    \
             public void bar()\n    \
             {\n        \
                 // max_stack: 1, max_locals: 1, 5 bytes of code, 0 exception handlers\n    \
             }\n\
         }\n"
    );
    assert!(class_file.analyse_all(&AnalysisOptions::none()).is_ok());
}

#[test]
fn test_render_interface() {
    let class_file = ClassFile::parse(&shape()).unwrap();

    assert!(class_file.is_interface());
    assert_eq!(
        class_file.render_to_string().unwrap(),
        "// Imports\n\
         import java.io.Serializable;\n\
         \n\
         public interface Shape\n\
         extends Comparable,\n\
         Serializable\n\
         {\n    \
             // Methods\n    \
             public abstract double area();\n    \
             public abstract String name();\n\
         }\n"
    );
}

#[test]
fn test_interface_flag_selects_interface_rendering() {
    let bytes = ClassBuilder::new("Odd", ACC_INTERFACE | ACC_FINAL)
        .super_class("java/lang/Object")
        .method(ACC_PUBLIC, "bar", "()V", &[("Code", trivial_code())])
        .build();
    let class_file = ClassFile::parse(&bytes).unwrap();

    let text = class_file.render_to_string().unwrap();

    assert!(text.contains("final interface Odd\n{\n"));
    assert!(text.contains("    public void bar();\n"));
    assert!(!text.contains("max_stack"));
}

#[test]
fn test_render_class_with_fields_and_interfaces() {
    let class_file = ClassFile::parse(&base()).unwrap();

    let text = class_file.render_to_string().unwrap();

    assert!(text.starts_with(
        "// Imports\n\
         import java.io.IOException;\n\
         import java.util.List;\n\
         import java.util.RandomAccess;\n\
         \n\
         public abstract class Base\n\
         extends Parent\n\
         implements Runnable,\n\
         RandomAccess\n\
         {\n"
    ));
    assert!(text.contains(
        "    // Fields\n    \
         private static final int COUNT = 3;\n    \
         protected List items;\n\
         \n    \
         // Methods\n"
    ));
    assert!(text.contains("    public Base()\n    {\n"));
    assert!(text.contains("    public abstract void run();\n"));
    assert!(text.contains("    public static long sum(int... arg0) throws IOException\n"));
    assert!(text.ends_with("    }\n}\n"));
}

#[test]
fn test_method_view_reaches_its_class() {
    let class_file = ClassFile::parse(&base()).unwrap();

    let method = class_file.method_refs().last().unwrap();

    assert_eq!(method.name().unwrap(), "sum");
    assert_eq!(method.class().class_name().unwrap(), "com/example/Base");
    assert_eq!(method.code().unwrap().unwrap().max_stack, 4);
}

fn checked_methods() -> Vec<u8> {
    ClassBuilder::new("Checked", ACC_PUBLIC | ACC_SUPER)
        .super_class("java/lang/Object")
        .method(ACC_PUBLIC, "good", "()V", &[("Code", trivial_code())])
        .method(ACC_PUBLIC, "empty", "()V", &[("Code", code(0, 1, &[], &[]))])
        .method(
            ACC_PUBLIC,
            "escaping",
            "()V",
            &[("Code", code(1, 1, &[0xb1], &[[0, 1, 7, 0]]))],
        )
        .method(ACC_PUBLIC | ACC_ABSTRACT, "pending", "()V", &[])
        .build()
}

#[test]
fn test_failing_methods_do_not_stop_the_analysis() {
    let class_file = ClassFile::parse(&checked_methods()).unwrap();

    let report = class_file.analyse_methods(&AnalysisOptions::all());

    let outcomes = report
        .outcomes()
        .iter()
        .map(|o| (o.name.as_str(), matches!(o.outcome, Outcome::Failed(_))))
        .collect::<Vec<_>>();
    assert_eq!(
        outcomes,
        vec![
            ("good", false),
            ("empty", true),
            ("escaping", true),
            ("pending", false)
        ]
    );
    assert_eq!(report.analysed_count(), 2);

    let failed = report.into_result().unwrap_err();
    let names = failed
        .failures()
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["empty", "escaping"]);
}

#[test]
fn test_analyse_all_fails_after_trying_every_method() {
    let class_file = ClassFile::parse(&checked_methods()).unwrap();

    let error = class_file.analyse_all(&AnalysisOptions::all()).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AnalysisFailed);
    assert!(error.to_string().starts_with("Failed to analyse 2 method(s)"));
}

#[test]
fn test_analysis_only_visits_selected_methods() {
    let class_file = ClassFile::parse(&checked_methods()).unwrap();

    let report = class_file.analyse_methods(&AnalysisOptions::only(["good", "pending"]));

    assert!(report.is_success());
    assert_eq!(report.analysed_count(), 2);
    assert!(matches!(report.outcomes()[1].outcome, Outcome::Skipped));
}

struct Recorder {
    visited: RefCell<Vec<String>>,
}
impl Analyser for Recorder {
    fn should_analyse(&self, _method_name: &str) -> bool {
        true
    }

    fn analyse(&self, method: MethodRef<'_>, _code: &CodeAttribute) -> Result<(), BoxError> {
        let name = method.name()?;
        self.visited.borrow_mut().push(name.to_owned());
        if name == "<init>" {
            return Err("constructor rejected".into());
        }
        Ok(())
    }
}

#[test]
fn test_custom_analyser_sees_methods_in_declaration_order() {
    let class_file = ClassFile::parse(&base()).unwrap();
    let recorder = Recorder {
        visited: RefCell::new(Vec::new()),
    };

    let report = class_file.analyse_methods(&recorder);

    // run has no code, so only the other two reach the analyser.
    assert_eq!(*recorder.visited.borrow(), vec!["<init>", "sum"]);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.outcomes().len(), 3);
}
