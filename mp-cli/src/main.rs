//! # mp CLI
//!
//! JSON checkers for shell pipelines. Each subcommand reads one document,
//! checks it, and echoes it unchanged so checks can be chained:
//!
//! ```text
//! curl -s ... | mp mt --kind Order --tags status=open | mp mj --ints total=12 --fin
//! ```

mod check;

use anyhow::Context as _;
use check::{parse_int_pair, parse_pair, JsonCheck, MetaCheck};
use clap::{Args, Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read the document from a file instead of stdin
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a Meta document
    Mt {
        /// Expected kind
        #[arg(long)]
        kind: Option<String>,

        /// Expected tags (comma separated key=value)
        #[arg(long, value_delimiter = ',', value_parser = parse_pair)]
        tags: Vec<(String, String)>,

        /// Expected attributes (comma separated key=value)
        #[arg(long, value_delimiter = ',', value_parser = parse_pair)]
        attrs: Vec<(String, String)>,

        #[command(flatten)]
        output: Output,
    },

    /// Check a plain JSON document
    Mj {
        /// Expected string fields (comma separated key=value)
        #[arg(long, value_delimiter = ',', value_parser = parse_pair)]
        attrs: Vec<(String, String)>,

        /// Expected integer fields (comma separated key=n)
        #[arg(long, value_delimiter = ',', value_parser = parse_int_pair)]
        ints: Vec<(String, i64)>,

        /// The whole document is this string
        #[arg(long = "str", conflicts_with = "int")]
        string: Option<String>,

        /// The whole document is this integer
        #[arg(long, allow_hyphen_values = true)]
        int: Option<i64>,

        #[command(flatten)]
        output: Output,
    },
}

#[derive(Args)]
struct Output {
    /// Last check in the pipeline: do not echo the input
    #[arg(long)]
    fin: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the echoed document
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let buf = read_input(cli.input.as_deref())?;
    tracing::debug!(bytes = buf.len(), "Read document");

    let (result, output) = match cli.command {
        Commands::Mt {
            kind,
            tags,
            attrs,
            output,
        } => (MetaCheck { kind, tags, attrs }.run(&buf), output),
        Commands::Mj {
            attrs,
            ints,
            string,
            int,
            output,
        } => (
            JsonCheck {
                attrs,
                ints,
                string,
                int,
            }
            .run(&buf),
            output,
        ),
    };

    if let Err(mismatch) = result {
        println!("{mismatch}");
        std::process::exit(1);
    }

    if !output.fin {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&buf)?;
        stdout.flush()?;
    }
    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
