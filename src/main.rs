//! tabexport - convert CSV data to other formats

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;

use tabexport::config::{ExportConfig, ExportFormat};
use tabexport::dispatch::export_with;

/// Convert a CSV file to CSV, JSON, XLSX, ODS or PDF
#[derive(Parser, Debug)]
#[command(name = "tabexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV file
    #[arg(required_unless_present = "list_formats")]
    input: Option<PathBuf>,

    /// Output format (csv, json, xlsx, ods, pdf)
    #[arg(required_unless_present = "list_formats")]
    format: Option<String>,

    /// Output file name; the format's extension is added when missing
    #[arg(required_unless_present = "list_formats")]
    output: Option<String>,

    /// Field delimiter of the input file
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,

    /// List supported output formats
    #[arg(short, long)]
    list_formats: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_formats {
        let formats: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.as_str()).collect();
        println!("{}", formats.join(" "));
        return Ok(());
    }

    let (Some(input), Some(format), Some(output)) = (cli.input, cli.format, cli.output) else {
        bail!("input, format and output are required");
    };

    let delimiter = match u8::try_from(cli.delimiter) {
        Ok(byte) if byte.is_ascii() => byte,
        _ => bail!("Delimiter must be a single ASCII character: {:?}", cli.delimiter),
    };

    let format: ExportFormat = format.parse()?;
    let config = ExportConfig::new(input, format, output).with_delimiter(delimiter);
    let written = export_with(&config)?;

    println!("{}", written.display());
    Ok(())
}
