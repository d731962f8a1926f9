//! Listing data CLI: merge exports, extract addresses, attach descriptions.

use anyhow::Context;
use clap::{Parser, Subcommand};
use propeval::{
    config::ListingsConfig,
    listings::{
        attach_descriptions, extract_addresses, load_descriptions, load_listings, merge_listings,
        write_json_pretty,
    },
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "listings")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge property, rent and sale exports by formattedAddress.
    Merge {
        #[arg(long)]
        properties: Option<PathBuf>,
        #[arg(long)]
        rent: Option<PathBuf>,
        #[arg(long)]
        sale: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the address list used for description generation.
    ExtractAddresses {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Attach generated descriptions to merged listings.
    AttachDescriptions {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        descriptions: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn read(path: &Path) -> anyhow::Result<Vec<propeval::eval::records::Record>> {
    load_listings(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let paths = ListingsConfig::load_or_default()?;

    match args.command {
        Command::Merge {
            properties,
            rent,
            sale,
            output,
        } => {
            let properties = read(&properties.unwrap_or(paths.properties_path))?;
            let rents = read(&rent.unwrap_or(paths.rent_path))?;
            let sales = read(&sale.unwrap_or(paths.sale_path))?;
            let output = output.unwrap_or(paths.merged_path);

            let merged = merge_listings(&properties, &rents, &sales)?;
            write_json_pretty(&output, &merged)?;
            println!("Merged {} listings into {}", merged.len(), output.display());
        }
        Command::ExtractAddresses { input, output } => {
            let merged = read(&input.unwrap_or(paths.merged_path))?;
            let output = output.unwrap_or(paths.addresses_path);

            let addresses = extract_addresses(&merged)?;
            write_json_pretty(&output, &addresses)?;
            println!("Extracted {} addresses into {}", addresses.len(), output.display());
        }
        Command::AttachDescriptions {
            input,
            descriptions,
            output,
        } => {
            let mut merged = read(&input.unwrap_or(paths.merged_path))?;
            let descriptions_path = descriptions.unwrap_or(paths.descriptions_path);
            let descriptions = load_descriptions(&descriptions_path).with_context(|| {
                format!("Failed to read descriptions from {}", descriptions_path.display())
            })?;
            let output = output.unwrap_or(paths.full_property_path);

            let matched = attach_descriptions(&mut merged, &descriptions);
            write_json_pretty(&output, &merged)?;
            println!(
                "Attached {}/{} descriptions. Output saved to {}",
                matched,
                merged.len(),
                output.display()
            );
        }
    }

    Ok(())
}
