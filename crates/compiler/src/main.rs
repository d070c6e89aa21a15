//! Pyrite Compiler CLI
//!
//! Command-line interface for compiling Pyrite sources to C and driving
//! the external C compiler to a native executable.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use pyritec::BuildConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "pyritec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pyrite compiler - compile typed Python-dialect sources to C", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to a native executable
    Build {
        /// Input source file
        input: PathBuf,

        /// Stop after writing the C translation unit
        #[arg(long)]
        emit_only: bool,

        /// External C compiler to invoke (overrides pyrite.toml)
        #[arg(long)]
        cc: Option<String>,

        /// Path to a build configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Dump the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,
    },

    /// Dump the parsed declarations of a source file
    Ast {
        /// Input source file
        input: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            emit_only,
            cc,
            config,
        } => run_build(&input, emit_only, cc, config.as_deref()),
        Commands::Tokens { input } => run_tokens(&input),
        Commands::Ast { input } => run_ast(&input),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_build(input: &Path, emit_only: bool, cc: Option<String>, config_path: Option<&Path>) {
    println!("compiling `{}`", input.display());

    let c_path = match pyritec::compile_file(input) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if emit_only {
        println!("C translation unit written to {}", c_path.display());
        return;
    }

    let mut config = load_config(input, config_path);
    if let Some(cc) = cc {
        config.cc.program = cc;
    }

    let exe_path = pyritec::executable_path(input);
    if let Err(e) = pyritec::build_executable(&c_path, &exe_path, &config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    println!("done!");
    println!("run with ./{}", exe_path.display());
}

fn load_config(input: &Path, config_path: Option<&Path>) -> BuildConfig {
    let loaded = match config_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => BuildConfig::from_toml(&content),
            Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
        },
        None => BuildConfig::load_near(input),
    };

    match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_tokens(input: &Path) {
    let source = read_source(input);
    let mut hook = pyritec::tokenizer::tokenize(&source);

    loop {
        match hook.take() {
            Ok(token) => {
                if token.is_eof() {
                    break;
                }
                println!("{:?}", token);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn run_ast(input: &Path) {
    let source = read_source(input);

    match pyritec::Parser::new(&source).parse() {
        Ok(decls) => {
            for decl in decls {
                println!("{:#?}", decl);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pyritec", &mut io::stdout());
}

fn read_source(input: &Path) -> String {
    match std::fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", input.display(), e);
            process::exit(1);
        }
    }
}
