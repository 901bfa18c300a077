use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use rox::parser::Parser;
use rox::scanner::scan_tokens;
use rox::session::{RunError, Session};

/// Exit code for lexical, syntax and resolution errors.
const EXIT_STATIC: i32 = 65;

/// Exit code for runtime errors.
const EXIT_RUNTIME: i32 = 70;

/// Exit code for failures reading input or writing output.
const EXIT_IO: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Runs a file as a program, or starts an interactive prompt without one
    Run {
        filename: Option<PathBuf>,

        /// Maximum depth of nested function calls
        #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
        max_depth: usize,
    },
}

/// Maps a script into memory.
fn read_file(filename: &Path) -> Result<Mmap> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is only read, and scripts are not expected to be
    // rewritten while the interpreter runs.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", map.len(), filename);

    Ok(map)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(diagnostics: &[LoxError]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn exit_code(error: &RunError) -> i32 {
    match error {
        RunError::Static(_) => EXIT_STATIC,
        RunError::Runtime(_) => EXIT_RUNTIME,
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let buf = read_file(filename)?;
    let (tokens, errors) = scan_tokens(&buf);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    report(&errors);

    Ok(if errors.is_empty() { 0 } else { EXIT_STATIC })
}

fn parse(filename: &Path, json: bool) -> Result<i32> {
    let buf = read_file(filename)?;
    let (tokens, lex_errors) = scan_tokens(&buf);

    match Parser::new(tokens).parse() {
        Ok(statements) if lex_errors.is_empty() => {
            if json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                println!("{}", AstPrinter::print_program(&statements));
            }
            Ok(0)
        }

        Ok(_) => {
            report(&lex_errors);
            Ok(EXIT_STATIC)
        }

        Err(parse_errors) => {
            report(&lex_errors);
            report(&parse_errors);
            Ok(EXIT_STATIC)
        }
    }
}

fn run_file(filename: &Path, max_depth: usize) -> Result<i32> {
    let buf = read_file(filename)?;
    let mut session = Session::with_interpreter(Interpreter::new().with_max_call_depth(max_depth));

    match session.run(&buf) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }

        Err(e) => {
            debug!("Run failed: {}", e);
            for diagnostic in e.diagnostics() {
                eprintln!("{}", diagnostic);
            }
            Ok(exit_code(&e))
        }
    }
}

/// Reads and runs one line at a time until end of input.  Errors are reported
/// and the prompt carries on with the same globals.
fn repl(max_depth: usize) -> Result<i32> {
    info!("Starting interactive prompt");

    let mut session = Session::with_interpreter(Interpreter::new().with_max_call_depth(max_depth));
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        if let Err(e) = session.run(line.as_bytes()) {
            for diagnostic in e.diagnostics() {
                eprintln!("{}", diagnostic);
            }
        }
    }

    println!();
    Ok(0)
}

fn execute(args: Cli) -> Result<i32> {
    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),

        Commands::Parse { filename, json } => parse(&filename, json),

        Commands::Run {
            filename: Some(filename),
            max_depth,
        } => run_file(&filename, max_depth),

        Commands::Run {
            filename: None,
            max_depth,
        } => repl(max_depth),
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = execute(args).unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        EXIT_IO
    });

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
