//! # occ
//!
//! Reads an oc syntax tree, writes the declaration report (`.sym`) and the
//! intermediate code (`.oil`).

use std::{
    ffi::OsString,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{ArgAction, Parser, ValueEnum};
use oc::{
    analyzer::Analyzer,
    emit::Emitter,
    reader,
    token::Located,
    util::{
        fmt::{render_all, tree, Context, Diagnostic},
        intern::Interner,
    },
};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, prelude::*};

const STDIN: &str = "-";
const STDIN_STEM: &str = "oc";

#[derive(Parser)]
#[command(name = "occ", version, about = "Analyzes an oc syntax tree and emits intermediate code")]
struct Args {
    /// Syntax tree in interchange format, or `-` for standard input.
    input: PathBuf,

    /// Path of the outputs, without extension. Defaults to the input path
    /// without its extension.
    #[arg(short, long, value_name = "STEM")]
    out_stem: Option<PathBuf>,

    /// Artifacts to write.
    #[arg(long, value_enum, default_values_t = [Artifact::Sym, Artifact::Oil])]
    emit: Vec<Artifact>,

    /// Logs more. Repeat for even more (info, debug, trace).
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Artifact {
    /// Declaration report.
    Sym,
    /// Intermediate code.
    Oil,
    /// Annotated syntax tree.
    Ast,
}

impl Artifact {
    const fn extension(self) -> &'static str {
        match self {
            Artifact::Sym => "sym",
            Artifact::Oil => "oil",
            Artifact::Ast => "ast",
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("can't read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("can't write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("found {0} error(s) reading the syntax tree")]
    Tree(usize),
    #[error("found {0} error(s) in the program")]
    Analysis(usize),
    #[error("found {0} error(s) emitting code")]
    Emission(usize),
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("occ: {error}");
            ExitCode::FAILURE
        }
    }
}

fn logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let layer = tracing_subscriber::fmt::Layer::default()
        .without_time()
        .with_ansi(false)
        .with_writer(BoxMakeWriter::new(io::stderr))
        .with_filter(level);
    tracing_subscriber::registry().with(layer).init();
}

fn run(args: &Args) -> Result<(), Error> {
    let src = read_input(&args.input)?;
    let stem = match &args.out_stem {
        Some(stem) => stem.clone(),
        None if args.input == Path::new(STDIN) => PathBuf::from(STDIN_STEM),
        None => args.input.with_extension(""),
    };
    let idents = &mut Interner::with_capacity(1024);

    let mut root = match reader::read_tree(&src, idents) {
        Ok(root) => root,
        Err((_, errors)) => {
            print_errors(idents, &errors);
            return Err(Error::Tree(errors.len()));
        }
    };
    info!(declarations = root.children.len(), "read syntax tree");

    let (analysis, errors) = match Analyzer::with_capacity(idents, 64).analyze(&mut root) {
        Ok(analysis) => (analysis, Vec::new()),
        Err((analysis, errors)) => (analysis, errors),
    };
    print_errors(idents, &errors);

    if args.emit.contains(&Artifact::Sym) {
        write_artifact(&stem, Artifact::Sym, &analysis.report)?;
    }
    if args.emit.contains(&Artifact::Ast) {
        let dump = tree::print_tree_string(idents, &root, tree::Annotate::Attributes);
        write_artifact(&stem, Artifact::Ast, &dump)?;
    }
    if !errors.is_empty() {
        warn!("skipping code emission");
        return Err(Error::Analysis(errors.len()));
    }

    if args.emit.contains(&Artifact::Oil) {
        let code = match Emitter::new(idents, &analysis).emit(&root) {
            Ok(code) => code,
            Err((_, errors)) => {
                print_errors(idents, &errors);
                return Err(Error::Emission(errors.len()));
            }
        };
        write_artifact(&stem, Artifact::Oil, &code)?;
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String, Error> {
    let read = |source| Error::Read {
        path: path.to_owned(),
        source,
    };
    if path == Path::new(STDIN) {
        info!("reading standard input");
        let mut src = String::new();
        io::stdin().read_to_string(&mut src).map_err(read)?;
        Ok(src)
    } else {
        info!(path = %path.display(), "reading");
        fs::read_to_string(path).map_err(read)
    }
}

fn write_artifact(stem: &Path, artifact: Artifact, contents: &str) -> Result<(), Error> {
    let mut path = OsString::from(stem);
    path.push(".");
    path.push(artifact.extension());
    let path = PathBuf::from(path);

    info!(path = %path.display(), "writing");
    fs::write(&path, contents).map_err(|source| Error::Write { path, source })
}

fn print_errors<E: Diagnostic>(idents: &Interner<str>, errors: &[Located<E>]) {
    for error in render_all(&Context::new(idents), errors) {
        eprintln!("error: {error}");
    }
}
