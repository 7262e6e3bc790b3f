//! Config command - inspect and initialize keyword configuration.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use billscan_core::ProviderSettings;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    /// Provider whose settings to manage
    #[arg(short, long, default_value = "verizon")]
    provider: String,

    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the resolved configuration (file values merged with defaults)
    Show,

    /// Write a keywords file populated with the built-in defaults
    Init(InitArgs),

    /// Show the keywords file path and whether it exists
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the keywords file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

const DEFAULT_KEYWORDS_FILE: &str = "keywords.json";

pub fn run(args: ConfigArgs, keywords_path: Option<&str>) -> anyhow::Result<()> {
    let path = PathBuf::from(keywords_path.unwrap_or(DEFAULT_KEYWORDS_FILE));
    match args.command {
        ConfigCommand::Show => show_config(&path, &args.provider),
        ConfigCommand::Init(init_args) => init_config(init_args, &path, &args.provider),
        ConfigCommand::Path => show_path(&path),
    }
}

fn show_config(path: &Path, provider: &str) -> anyhow::Result<()> {
    let settings = if path.exists() {
        ProviderSettings::from_file(path, provider)
    } else {
        println!(
            "{} No keywords file found, showing built-in defaults.",
            style("ℹ").blue()
        );
        ProviderSettings::default()
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);

    Ok(())
}

fn init_config(args: InitArgs, default_path: &Path, provider: &str) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| default_path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Keywords file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    ProviderSettings::default().write_file(&output_path, provider)?;

    println!(
        "{} Created keywords file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Keywords file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'billscan config init' to create one with the defaults.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_show_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");

        init_config(
            InitArgs {
                output: Some(path.clone()),
                force: false,
            },
            &path,
            "verizon",
        )
        .unwrap();
        assert!(path.exists());

        let loaded = ProviderSettings::from_file(&path, "verizon");
        assert_eq!(
            loaded.document_markers,
            ProviderSettings::default().document_markers
        );
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, "{}").unwrap();

        let result = init_config(
            InitArgs {
                output: Some(path.clone()),
                force: false,
            },
            &path,
            "verizon",
        );
        assert!(result.is_err());
    }
}
