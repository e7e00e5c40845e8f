//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación y expone una CLI.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, Arg, Command};
use toyc::{
    lex,
    semantic::SymbolTable,
    source::Source,
    CompileOptions,
};

use std::{
    fs::File,
    io::{self, Write},
};

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("toyc")
        .version(crate_version!())
        .about("Compiles assignments and if/else statements to pseudo-assembly")
        .arg(
            Arg::new("input")
                .index(1)
                .value_name("INPUT")
                .default_value("-")
                .help("Source file ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("-")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .takes_value(true)
                .value_name("STAGE")
                .default_value("asm")
                .possible_values(["tokens", "ast", "asm"])
                .help("Artifact to print"),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .long("define")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("NAME")
                .help("Treat a variable as already defined"),
        )
        .arg(
            Arg::new("deny-warnings")
                .long("deny-warnings")
                .help("Treat semantic warnings as errors"),
        )
        .arg(
            Arg::new("annotate")
                .long("annotate")
                .help("Annotate comparisons with their relational operator"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase log verbosity"),
        )
        .get_matches();

    init_logging(args.occurrences_of("verbose"));

    let mut options = CompileOptions::empty();
    if args.is_present("deny-warnings") {
        options |= CompileOptions::DENY_WARNINGS;
    }

    if args.is_present("annotate") {
        options |= CompileOptions::ANNOTATE;
    }

    let symbols: SymbolTable = args
        .values_of("define")
        .into_iter()
        .flatten()
        .collect();

    // `value_of()` nunca falla para argumentos con valor por omisión
    let input = args.value_of("input").unwrap_or("-");
    let output = args.value_of("output").unwrap_or("-");
    let emit = args.value_of("emit").unwrap_or("asm");

    let source = match input {
        "-" => Source::read(io::stdin().lock(), "<stdin>").context("Failed to read from stdin")?,
        path => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open for reading: {}", path))?;

            Source::read(file, path).with_context(|| format!("Failed to read: {}", path))?
        }
    };

    let mut sink: Box<dyn Write> = match output {
        "-" => Box::new(io::stdout()),
        path => Box::new(
            File::create(path).with_context(|| format!("Failed to open for writing: {}", path))?,
        ),
    };

    // Los tokens no dependen de las fases posteriores
    if emit == "tokens" {
        let tokens = match toyc::scan(&source) {
            Ok(tokens) => tokens,
            Err(diagnostics) => {
                eprint!("{}", diagnostics.display(&source));
                bail!("Could not tokenize {}", source.name());
            }
        };

        lex::write_tokens(&tokens, &mut sink)?;
        sink.flush().context("Failed to write output")?;
        return Ok(());
    }

    let compilation = match toyc::compile(&source, symbols, options) {
        Ok(compilation) => compilation,
        Err(diagnostics) => {
            eprint!("{}", diagnostics.display(&source));
            bail!("Could not compile {}", source.name());
        }
    };

    if !compilation.warnings.is_empty() {
        eprint!("{}", compilation.warning_report().display(&source));
    }

    match emit {
        "ast" => write!(sink, "{}", compilation.program.pretty())?,

        _ => {
            for line in compilation.listing() {
                writeln!(sink, "{}", line)?;
            }
        }
    }

    sink.flush().context("Failed to write output")?;
    Ok(())
}

/// Instala un suscriptor de `tracing` sobre stderr.
///
/// `RUST_LOG` tiene prioridad sobre `-v`.
fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => "error",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}
