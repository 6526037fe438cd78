use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tools::{cities_file_name, parse_cities, parse_country_info};

#[derive(Parser, Debug)]
#[command(name = "mapprep", version, about = "Prepares travel map data files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Writes the numeric-id to ISO3 index from GeoNames `countryInfo.txt`.
    CountryCodes {
        #[arg(long, default_value = "countryInfo.txt")]
        input: PathBuf,
        #[arg(long, default_value = "id-to-country-code.json")]
        output: PathBuf,
    },
    /// Splits GeoNames `cities15000.txt` into one `cities-{cc}.json` per country.
    Cities {
        #[arg(long, default_value = "cities15000.txt")]
        input: PathBuf,
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = real_main(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::CountryCodes { input, output } => cmd_country_codes(&input, &output),
        Command::Cities { input, out_dir } => cmd_cities(&input, &out_dir),
    }
}

fn cmd_country_codes(input: &Path, output: &Path) -> Result<(), String> {
    let text = fs::read_to_string(input).map_err(|e| format!("read {input:?}: {e}"))?;
    let index = parse_country_info(&text).map_err(|e| format!("{input:?}: {e}"))?;
    write_json(output, &index)?;
    info!(entries = index.len(), output = %output.display(), "wrote country code index");
    Ok(())
}

fn cmd_cities(input: &Path, out_dir: &Path) -> Result<(), String> {
    let text = fs::read_to_string(input).map_err(|e| format!("read {input:?}: {e}"))?;
    let by_country = parse_cities(&text).map_err(|e| format!("{input:?}: {e}"))?;
    fs::create_dir_all(out_dir).map_err(|e| format!("create {out_dir:?}: {e}"))?;

    for (country, cities) in &by_country {
        write_json(&out_dir.join(cities_file_name(country)), cities)?;
    }
    info!(countries = by_country.len(), out_dir = %out_dir.display(), "wrote city files");
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("create {parent:?}: {e}"))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("encode {path:?}: {e}"))?;
    fs::write(path, json).map_err(|e| format!("write {path:?}: {e}"))
}
