use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use htd2xlsx::{collect_inputs, convert_batch, load_records, ConvertOptions, Settings};

#[derive(Parser)]
#[command(name = "htd2xlsx")]
#[command(about = "Converts test cases according to the ERIGrid HTD Template from Word into Excel files")]
#[command(version)]
struct Cli {
    /// Path to either a Word file or a folder. If a folder is provided, all Word files in that folder will be converted.
    #[arg(required_unless_present = "init_config")]
    path: Option<PathBuf>,

    /// Path to the Excel template that should be used [default: template/HTD_TEMPLATE_V1.2.xlsx next to the executable]
    #[arg(short = 't', long)]
    excel_template: Option<PathBuf>,

    /// Saves the Excel file and extracted images to a folder with the name of the Word file
    #[arg(short = 'f', long)]
    create_folder: bool,

    /// Copies the Word file into the new folder
    #[arg(short = 'c', long)]
    copy_word_file: bool,

    /// Print the extracted records as JSON instead of writing workbooks
    #[arg(long)]
    json: bool,

    /// Show debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Write a config file with the default settings and exit
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    /// Settings file values, overridden by flags given on the command line
    fn options(&self, settings: &Settings) -> ConvertOptions {
        let mut options = ConvertOptions::from(settings);
        if let Some(template) = &self.excel_template {
            options.template = template.clone();
        }
        options.create_folder |= self.create_folder;
        options.copy_word_file |= self.copy_word_file;
        options
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every input was handled
fn run(cli: &Cli) -> Result<bool> {
    if cli.init_config {
        match Settings::init_default()? {
            Some(path) => println!("Wrote default settings to {}", path.display()),
            None => bail!("no configuration directory available on this system"),
        }
        return Ok(true);
    }

    let Some(path) = cli.path.as_deref() else {
        bail!("no input path given");
    };
    let settings = Settings::load().context("Failed to load settings")?;
    let inputs = collect_inputs(path)
        .with_context(|| format!("Failed to list Word files in {}", path.display()))?;
    if inputs.is_empty() {
        tracing::warn!("No .docx files found in {}", path.display());
        return Ok(true);
    }

    if cli.json {
        return print_json(&inputs);
    }

    let report = convert_batch(&inputs, &cli.options(&settings));
    if report.results.len() > 1 {
        tracing::info!(
            "Converted {} of {} files",
            report.succeeded(),
            report.results.len()
        );
    }
    Ok(report.all_succeeded())
}

fn print_json(inputs: &[PathBuf]) -> Result<bool> {
    let mut all_ok = true;
    for input in inputs {
        match load_records(input) {
            Ok((_, extraction)) => {
                let json = serde_json::json!({
                    "file": input.display().to_string(),
                    "records": extraction,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            Err(err) => {
                tracing::error!("Could not open Word file: {}: {err}", input.display());
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}
