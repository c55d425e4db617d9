//! `xilo` — inspect, export, query, and compile silo files from the
//! command line. Holds no business logic beyond argument parsing, logging
//! setup, and dispatch to the library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use xilo::{Builder, CompileFlags, ExportFlags, LoadFlags, Silo};

#[derive(Parser)]
#[command(name = "xilo", about = "Compile XML into a binary silo and query it")]
struct Cli {
    /// Raise log verbosity (debug-level spans/events).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a silo's structure: node offsets, element names, attribute counts.
    Dump { file: PathBuf },
    /// Load a silo and print its XML export.
    Export { file: PathBuf },
    /// Load a silo, run an XPath-subset query, print each match's export.
    Query { file: PathBuf, xpath: String },
    /// Import SRC as XML, compile it, and write the silo to DST.
    Compile {
        src: PathBuf,
        dst: PathBuf,
        /// Rebuild even if DST already matches SRC's content guid.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> xilo::Result<()> {
    match command {
        Command::Dump { file } => dump(file),
        Command::Export { file } => export(file),
        Command::Query { file, xpath } => query(file, &xpath),
        Command::Compile { src, dst, force } => compile(src, dst, force),
    }
}

fn dump(file: PathBuf) -> xilo::Result<()> {
    let silo = Silo::load_from_file(&file, LoadFlags::NONE)?;
    let Some(root) = silo.root() else {
        println!("(empty silo)");
        return Ok(());
    };
    dump_node(&root, 0)
}

fn dump_node(node: &xilo::Node, depth: usize) -> xilo::Result<()> {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}[{}] <{}> attrs={}",
        node.offset(),
        node.element()?,
        node.attrs()?.len()
    );
    for child in node.children()? {
        dump_node(&child, depth + 1)?;
    }
    Ok(())
}

fn export(file: PathBuf) -> xilo::Result<()> {
    let silo = Silo::load_from_file(&file, LoadFlags::NONE)?;
    let flags = ExportFlags::ADD_HEADER | ExportFlags::FORMAT_MULTILINE | ExportFlags::FORMAT_INDENT;
    print!("{}", silo.to_xml(flags)?);
    Ok(())
}

fn query(file: PathBuf, xpath: &str) -> xilo::Result<()> {
    let silo = Silo::load_from_file(&file, LoadFlags::NONE)?;
    let flags = ExportFlags::FORMAT_MULTILINE | ExportFlags::FORMAT_INDENT;
    for node in silo.query(xpath, 0)? {
        print!("{}", node.export(flags)?);
    }
    Ok(())
}

fn compile(src: PathBuf, dst: PathBuf, force: bool) -> xilo::Result<()> {
    let mut builder = Builder::new();
    builder.import_file(&src)?;
    if force || !dst.exists() {
        let silo = builder.compile(CompileFlags::NONE)?;
        silo.save_to_file(&dst)?;
    } else {
        builder.ensure(&dst, CompileFlags::NONE, None)?;
    }
    Ok(())
}
