use std::{fs::File, io, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use decaf_class_file::{AnalysisOptions, ClassFile, SectionOffsets, WriteDumper};
use memmap::Mmap;

#[derive(Parser)]
#[command(name = "decaf")]
#[command(about = "Decodes a JVM class file and prints its declaration")]
#[command(version)]
struct Cli {
    /// Input .class file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Check the code of every method before rendering
    #[arg(short, long)]
    analyse: bool,

    /// Only analyse methods with this name (repeatable)
    #[arg(short, long = "method", value_name = "NAME")]
    methods: Vec<String>,

    /// Print the descriptor of the method with this name
    #[arg(long, value_name = "NAME")]
    lookup_method: Option<String>,

    /// Print the descriptor of the field with this name
    #[arg(long, value_name = "NAME")]
    lookup_field: Option<String>,

    /// Print the offset of every section
    #[arg(long)]
    offsets: bool,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let file = File::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    if file.metadata()?.len() == 0 {
        bail!("{} is empty", cli.input.display());
    }
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map {}", cli.input.display()))?;

    let class_file = ClassFile::parse(&mmap)
        .with_context(|| format!("Failed to decode {}", cli.input.display()))?;
    log::debug!("Decoded {}", class_file.class_name()?);

    if cli.offsets {
        print_offsets(class_file.offsets());
    }
    if let Some(name) = &cli.lookup_method {
        let method = class_file.method_by_name(name)?;
        println!("{} {}", name, class_file.method_descriptor(method)?);
    }
    if let Some(name) = &cli.lookup_field {
        let field = class_file.field_by_name(name)?;
        println!("{} {}", name, class_file.field_descriptor(field)?);
    }

    if cli.analyse {
        let options = if cli.methods.is_empty() {
            AnalysisOptions::all()
        } else {
            AnalysisOptions::only(cli.methods.iter().cloned())
        };
        let report = class_file.analyse_methods(&options);
        log::info!("Analysed {} method(s)", report.analysed_count());
        report.into_result()?;
    }

    let mut d = WriteDumper::new(io::stdout().lock());
    class_file.render(&mut d)?;
    d.finish()?;

    Ok(())
}

fn print_offsets(offsets: &SectionOffsets) {
    let sections = [
        ("constant_pool", offsets.constant_pool),
        ("access_flags", offsets.access_flags),
        ("this_class", offsets.this_class),
        ("super_class", offsets.super_class),
        ("interfaces_count", offsets.interfaces_count),
        ("interfaces", offsets.interfaces),
        ("fields_count", offsets.fields_count),
        ("fields", offsets.fields),
        ("methods_count", offsets.methods_count),
        ("methods", offsets.methods),
        ("attributes_count", offsets.attributes_count),
        ("attributes", offsets.attributes),
        ("end", offsets.end),
    ];

    println!("Offsets:");
    for (name, offset) in sections {
        println!("    {:<16} {}", name, offset);
    }
    println!();
}
