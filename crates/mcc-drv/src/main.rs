use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use log::debug;
use mcc_drv::config::Emit;
use mcc_drv::{check_syntax, check_typing, compile, emit_ast, emit_tokens, Config, DriverError};

#[derive(Debug, ClapParser)]
#[command(name = "mcc", about = "A MiniC to MIPS compiler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Run only the lexer and print the token stream.
    #[arg(long, value_name = "FILE", global = false)]
    emit_tokens: Option<PathBuf>,

    /// Run the lexer and parser and print an s-expression AST.
    #[arg(long, value_name = "FILE", global = false)]
    emit_ast: Option<PathBuf>,

    /// Raise log verbosity (equivalent to RUST_LOG=info).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// check_syntax + check_typing; prints OK or a formatted diagnostic.
    Check { file: PathBuf },
    /// compile(source, out_path); default OUT is FILE with a .s extension.
    Build {
        file: PathBuf,
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
        /// Abort on the first diagnostic instead of reporting one and stopping there.
        #[arg(long)]
        strict: bool,
    },
}

fn read_source(path: &PathBuf) -> Result<String, DriverError> {
    std::fs::read_to_string(path).map_err(|e| DriverError::ReadSource(path.clone(), e))
}

/// Resolve the one emit mode the invocation asked for into a `Config`.
/// `--emit-tokens`/`--emit-ast` take priority over a subcommand, matching
/// how they're documented as top-level inspection flags rather than
/// subcommands of their own.
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(file) = &cli.emit_tokens {
        return Ok(Config::new(file.clone(), Emit::Tokens).with_verbose(cli.verbose));
    }
    if let Some(file) = &cli.emit_ast {
        return Ok(Config::new(file.clone(), Emit::Ast).with_verbose(cli.verbose));
    }
    match &cli.command {
        Some(Command::Check { file }) => Ok(Config::new(file.clone(), Emit::Check).with_verbose(cli.verbose)),
        Some(Command::Build { file, output, strict }) => Ok(Config::new(file.clone(), Emit::Assembly)
            .with_output(output.clone())
            .with_strict(*strict)
            .with_verbose(cli.verbose)),
        None => Err(anyhow::anyhow!(
            "no command given (try `mcc check <FILE>` or `mcc build <FILE>`)"
        )),
    }
}

fn execute(config: &Config, source: &str) -> anyhow::Result<ExitCode> {
    match config.emit {
        Emit::Tokens => {
            debug!("running lexer only on {}", config.input.display());
            print!("{}", emit_tokens(source));
            Ok(ExitCode::SUCCESS)
        }
        Emit::Ast => {
            debug!("running lexer+parser on {}", config.input.display());
            print!("{}", emit_ast(source));
            Ok(ExitCode::SUCCESS)
        }
        Emit::Check => {
            debug!("checking {}", config.input.display());
            let syntax = check_syntax(source);
            if !syntax.is_syntax_correct {
                println!("{}", syntax.error.as_deref().unwrap_or("syntax error"));
                return Ok(ExitCode::FAILURE);
            }

            let typing = check_typing(source);
            if !typing.valid {
                println!("{}", typing.error.as_deref().unwrap_or("type error"));
                return Ok(ExitCode::FAILURE);
            }

            println!("OK");
            Ok(ExitCode::SUCCESS)
        }
        Emit::Assembly => {
            debug!("building {} -> {}", config.input.display(), config.output.display());
            let report = compile(source, &config.output, config.strict)?;
            if let Some(diagnostic) = report.diagnostic {
                println!("{}", diagnostic);
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;
    let source = read_source(&config.input).with_context(|| format!("reading {}", config.input.display()))?;
    execute(&config, &source)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(cli) {
        Ok(code) => code,
        // A `Diagnostic` about the user's MiniC source is expected data, not
        // a driver failure: print it and exit 1 rather than the 2 an
        // internal/IO error gets.
        Err(err) => match err.downcast_ref::<DriverError>() {
            Some(DriverError::Diagnostic(message)) => {
                println!("{}", message);
                ExitCode::FAILURE
            }
            _ => {
                eprintln!("error: {err:#}");
                ExitCode::from(2)
            }
        },
    }
}
