use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use amqp_gen::{generate_from_path, CompileError};

#[derive(Parser)]
#[command(name = "amqp-gen")]
#[command(about = "Generate Rust method codecs from an AMQP protocol schema", long_about = None)]
struct Cli {
    /// Protocol schema (XML); the generated Rust is printed to stdout
    schema: PathBuf,
}

fn main() -> Result<(), CompileError> {
    // stdout carries only the generated source
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(schema = %cli.schema.display(), "generating");

    let rust_code = generate_from_path(&cli.schema)?;
    println!("{}", rust_code);
    Ok(())
}
