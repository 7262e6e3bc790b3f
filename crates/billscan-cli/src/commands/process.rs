//! Process command - extract charges from a single bill PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use billscan_core::models::record::AccountCharges;
use billscan_core::store::{JsonFileStore, RecordStore, SaveOutcome};
use billscan_core::{
    BillScanner, ExtractionOutput, PageTextSource, PdfTextSource, ProviderSettings,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input bill PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Provider whose keyword configuration to use
    #[arg(short, long, default_value = "verizon")]
    provider: String,

    /// Page range to extract, e.g. "1,3-5" (default: all pages)
    #[arg(long, default_value = "")]
    pages: String,

    /// Replace configured keywords with these terms (repeatable)
    #[arg(long = "keyword")]
    keyword: Vec<String>,

    /// Save the result to a JSON record store at this path
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (one row per charge)
    Csv,
    /// Plain text summary
    Text,
}

pub fn run(args: ProcessArgs, keywords_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let settings = match keywords_path {
        Some(path) => ProviderSettings::from_file(Path::new(path), &args.provider),
        None => ProviderSettings::default(),
    };

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    pb.set_message("Loading PDF...");
    pb.set_position(10);
    let source = PdfTextSource::open(&args.input)?;
    debug!("PDF has {} pages", source.page_count());

    pb.set_message("Scanning for charges...");
    pb.set_position(40);
    let scanner = BillScanner::new(&args.provider, settings);
    let result = scanner.scan(&source, &args.pages, &args.keyword)?;

    pb.set_position(90);
    pb.finish_with_message("Done");

    println!(
        "{} Found {} contact(s), {} with charges",
        style("ℹ").blue(),
        result.contacts_found,
        result.contacts_with_charges
    );

    // Persistence failures don't discard the extraction result.
    if let Some(store_path) = &args.store {
        match save_result(store_path, &result) {
            Ok(SaveOutcome::Created { id }) => {
                println!("{} Saved record {id}", style("✓").green());
            }
            Ok(SaveOutcome::AlreadyExists { id }) => {
                println!(
                    "{} Record already stored (id {id}), not overwritten",
                    style("ℹ").blue()
                );
            }
            Err(e) => {
                warn!("failed to save record: {e}");
                eprintln!("{} Could not save record: {e}", style("!").yellow());
            }
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn save_result(
    path: &Path,
    result: &ExtractionOutput,
) -> Result<SaveOutcome, billscan_core::error::StoreError> {
    let mut store = JsonFileStore::open(path)?;
    store.save(result)
}

fn format_result(result: &ExtractionOutput, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => format_text(result),
    }
}

fn format_csv(result: &ExtractionOutput) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "phone",
        "name",
        "ukey",
        "keyword",
        "amount",
        "page",
        "parent_ukey",
        "category",
    ])?;

    for entry in &result.entries {
        for parent in &entry.money_amounts {
            wtr.write_record([
                &entry.phone,
                &entry.name,
                &parent.ukey,
                &parent.keyword,
                &parent.amount,
                &parent.page.to_string(),
                "",
                "",
            ])?;
            for child in &parent.sub_keys {
                wtr.write_record([
                    &entry.phone,
                    &entry.name,
                    &child.ukey,
                    &child.keyword,
                    &child.amount,
                    &child.page.to_string(),
                    &parent.ukey,
                    &child.category,
                ])?;
            }
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionOutput) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str(&format!(
        "Provider: {} ({} pages)\n",
        result.provider, result.total_pages
    ));

    let summary = &result.summary;
    if let Some(account) = &summary.account {
        output.push_str(&format!("Account: {}\n", account));
    }
    if let Some(invoice) = &summary.invoice {
        output.push_str(&format!("Invoice: {}\n", invoice));
    }
    if let Some(period) = &summary.billing_period {
        output.push_str(&format!("Billing period: {}\n", period));
    }
    if let Some(due) = &summary.due_date {
        output.push_str(&format!("Due date: {}\n", due));
    }
    if let Some(total) = &summary.total_charges {
        output.push_str(&format!("Total charges: {}\n", total));
    }

    for field in &summary.money_amounts {
        output.push_str(&format!("{}: {}\n", field.name, field.amount));
    }

    match &summary.late_fees {
        AccountCharges::SectionMissing => {}
        AccountCharges::NoLateFees => output.push_str("Late fees: none\n"),
        AccountCharges::Found(fees) => {
            for fee in fees {
                output.push_str(&format!("Late fee: {} (page {})\n", fee.amount, fee.page));
            }
        }
    }

    for balance in &summary.previous_balance {
        output.push_str(&format!("{}: {}", balance.name, balance.amount));
        if !balance.date.is_empty() {
            output.push_str(&format!(" ({})", balance.date));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "\nContacts: {} ({} with charges)\n",
        result.contacts_found, result.contacts_with_charges
    ));

    for entry in &result.entries {
        output.push_str(&format!("\n{} {}\n", entry.name, entry.phone));
        for parent in &entry.money_amounts {
            output.push_str(&format!(
                "  {:<30} {:>10}  (page {})\n",
                parent.name, parent.amount, parent.page
            ));
            for child in &parent.sub_keys {
                let mut line = format!("    {:<28} {:>10}", child.name, child.amount);
                if let Some(range) = &child.date_range {
                    line.push_str(&format!("  {range}"));
                }
                if let Some(installment) = &child.installment {
                    line.push_str(&format!("  [{installment}]"));
                }
                line.push('\n');
                output.push_str(&line);
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use billscan_core::models::record::{
        ChildEntry, ContactRecord, DocumentSummary, ParentEntry,
    };

    fn sample() -> ExtractionOutput {
        ExtractionOutput {
            provider: "verizon".to_string(),
            total_pages: 2,
            contacts_found: 1,
            contacts_with_charges: 1,
            entries: vec![ContactRecord {
                phone: "555-123-4567".to_string(),
                name: "Jane Doe".to_string(),
                money_amounts: vec![ParentEntry {
                    amount: "$75.00".to_string(),
                    keyword: "Monthly Charges".to_string(),
                    name: "Monthly Charges".to_string(),
                    ukey: "monthly".to_string(),
                    inline_context: "Monthly Charges $75.00".to_string(),
                    page: 2,
                    sub_keys: vec![ChildEntry {
                        amount: "-$12.00".to_string(),
                        keyword: "Promo Credit".to_string(),
                        name: "Promo Credit".to_string(),
                        ukey: "promo".to_string(),
                        inline_context: "Promo Credit -$12.00".to_string(),
                        parent_keyword: "Monthly Charges".to_string(),
                        page: 2,
                        installment: None,
                        expiration: None,
                        date_range: Some("3/1 - 3/31".to_string()),
                        allow_multiple: false,
                        category: "credits".to_string(),
                    }],
                }],
            }],
            summary: DocumentSummary {
                account: Some("920-1".to_string()),
                ..DocumentSummary::default()
            },
        }
    }

    #[test]
    fn test_csv_has_parent_and_child_rows() {
        let csv = format_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("monthly"));
        assert!(lines[2].contains("promo"));
        assert!(lines[2].contains("credits"));
    }

    #[test]
    fn test_text_summary_mentions_account_and_charges() {
        let text = format_text(&sample()).unwrap();
        assert!(text.contains("Account: 920-1"));
        assert!(text.contains("Jane Doe 555-123-4567"));
        assert!(text.contains("$75.00"));
        assert!(text.contains("3/1 - 3/31"));
    }

    #[test]
    fn test_json_round_trips() {
        let json = format_result(&sample(), OutputFormat::Json).unwrap();
        let parsed: ExtractionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }
}
