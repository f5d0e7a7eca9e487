use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use conduit_compiler::error::CompileError;
use conduit_compiler::normalizer::normalize_blocks;
use conduit_compiler::tokenizer::tokenize_schema;
use conduit_compiler::traits::{Generator, SchemaRenderer, TypeRenderer};
use conduit_compiler::types::{Declaration, DeclarationValue, Representable};
use conduit_compiler::{compile_file, FsLoader, JsonGenerator};

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Check, compile, or inspect Conduit schemas", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a `.conduit` file and its imports, then list what it declares
    Check {
        /// Input `.conduit` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Resolve a `.conduit` file and write the result as JSON
    Compile {
        /// Input `.conduit` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.json` file (defaults to same name + `.json`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the token stream of a `.conduit` file, one token per line
    Tokens {
        /// Input `.conduit` file
        #[arg(short, long)]
        input: PathBuf,

        /// Skip block normalization and print the tokenizer output as is
        #[arg(long)]
        raw: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli.command) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: &Commands) -> Result<(), CompileError> {
    match command {
        Commands::Check { input } => {
            let file = compile_file(input, &FsLoader)?;
            println!("ok: {} ({} declarations)", input.display(), file.declarations.len());
            for declaration in &file.declarations {
                print_declaration(declaration, 1, &SchemaRenderer);
            }
            Ok(())
        }

        Commands::Compile { input, output } => {
            let file = compile_file(input, &FsLoader)?;
            for generated in JsonGenerator.generate(&file)? {
                let out_path = output.clone().unwrap_or(generated.path);
                fs::write(&out_path, &generated.contents)?;
                info!(path = %out_path.display(), bytes = generated.contents.len(), "wrote output");
                println!("Compiled {} → {}", input.display(), out_path.display());
            }
            Ok(())
        }

        Commands::Tokens { input, raw } => {
            let text = read_schema(input)?;
            let mut tokens = tokenize_schema(&text)?;
            if !raw {
                tokens = normalize_blocks(tokens);
            }
            for token in tokens {
                println!("{}:{}\t{}", token.line, token.column, token.kind);
            }
            Ok(())
        }
    }
}

fn read_schema(path: &Path) -> Result<String, CompileError> {
    Ok(fs::read_to_string(path)?)
}

fn print_declaration(declaration: &Declaration<Representable>, depth: usize, renderer: &dyn TypeRenderer) {
    let indent = "  ".repeat(depth);
    match &declaration.value {
        DeclarationValue::Import { imported_names, path } => {
            println!("{}import {} from \"{}\"", indent, imported_names.join(", "), path);
        }
        DeclarationValue::Service { members } => {
            println!("{}service {}", indent, declaration.name);
            for member in members {
                print_declaration(member, depth + 1, renderer);
            }
        }
        value => {
            let keyword = value.kind().rsplit(' ').next().unwrap_or_default();
            println!("{}{} {}", indent, keyword, declaration.name);
            for field in value.fields() {
                let modifier = if field.optional { "optional " } else { "" };
                println!("{}  {}: {}{}", indent, field.name, modifier, renderer.render(&field.type_));
            }
        }
    }
}
