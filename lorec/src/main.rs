use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use lore::{
    codegen::interface::Backend, driver, lexer::DecimalPoints, module::SourceModule,
    util::fmt::tree,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
enum Emit {
    Tokens,
    Ast,
    Ir,
}

/// Compiles a lore source file into IR.
#[derive(Parser)]
#[clap(version)]
struct Command {
    /// Source file to compile
    input: PathBuf,

    /// What to print
    #[clap(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    /// Write to this file instead of stdout
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Fail on a second '.' in a number instead of ending the literal there
    #[clap(long)]
    reject_repeated_decimal_point: bool,

    /// Do not emit the stub that calls `main`
    #[clap(long)]
    no_entry_stub: bool,

    /// Log more, repeat for more detail (overridden by RUST_LOG)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
    #[error(transparent)]
    Compile(#[from] lore::Error),
}

fn main() -> ExitCode {
    let command = Command::parse();
    init_logging(command.verbose);

    match run(&command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Compile(error)) => {
            eprint!("{}", error.diagnostic());
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .without_time()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn options(command: &Command) -> driver::Options {
    let mut options = driver::Options::for_module(&SourceModule::from_path(&command.input));
    if command.reject_repeated_decimal_point {
        options.lexer.decimal_points = DecimalPoints::Reject;
    }
    if command.no_entry_stub {
        options.entry_stub = None;
    }
    options
}

fn run(command: &Command) -> Result<(), CliError> {
    let src = fs::read_to_string(&command.input).map_err(|source| CliError::Read {
        path: command.input.clone(),
        source,
    })?;
    let options = options(command);
    debug!(input = %command.input.display(), emit = ?command.emit, "running");

    let mut out: Box<dyn Write> = match &command.output {
        Some(path) => Box::new(io::BufWriter::new(fs::File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    match command.emit {
        Emit::Tokens => {
            for lexeme in driver::lex(&src, &options)? {
                writeln!(out, "{} {lexeme}", lexeme.location)?;
            }
        }
        Emit::Ast => {
            let root = driver::parse(&src, &options)?;
            tree::print_program(&mut out, &root)?;
        }
        Emit::Ir => {
            let module = driver::compile(&src, &options)?;
            module.dump(&mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}
