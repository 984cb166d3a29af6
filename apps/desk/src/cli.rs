//! # Command-Line Entry Point
//!
//! ```text
//! medibill-desk [--db <path>] [--config <path>] <command>
//!
//!   totals <file.json>   Price a purchase/sale document and print its totals
//!   save <file.json>     Validate a document and record it in the database
//!   search <text>        Search medicines, suppliers and customers
//!   stock                Stock per medicine with low-stock levels
//!   dashboard            Headline figures, low stock and recent invoices
//! ```
//!
//! Document files are the JSON form of [`medibill_core::Document`]:
//! ```json
//! {
//!   "kind": "purchase",
//!   "tax_mode": "exclusive",
//!   "invoice_number": "INV-9001",
//!   "party_id": "…",
//!   "lines": [{ "medicine_name": "Dolo 650", "quantity": 100, "unit_price": 10.5 }]
//! }
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use medibill_core::pricing::compute_lines;
use medibill_core::stock::MedicineSummary;
use medibill_core::{
    build_payload, compute_document_totals, validate_for_submission, CatalogSource, Document,
};
use tracing::info;

use crate::commands::{self, record_payload, DashboardView, TotalsView};
use crate::error::ApiError;
use crate::state::AppConfig;
use crate::App;

pub const USAGE: &str = "\
MediBill desk

Usage: medibill-desk [OPTIONS] <COMMAND>

Commands:
  totals <FILE>    Price a document (JSON) and print its totals
  save <FILE>      Validate a document (JSON) and record it
  search <TEXT>    Search medicines, suppliers and customers
  stock            Stock per medicine with low-stock levels
  dashboard        Headline figures, low stock and recent invoices

Options:
  -d, --db <PATH>      Database file path
  -c, --config <PATH>  Config file path (default: platform config dir)
  -h, --help           Show this help message";

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Totals { file: PathBuf },
    Save { file: PathBuf },
    Search { query: String },
    Stock,
    Dashboard,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub command: CliCommand,
    pub db_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    /// Parses arguments (without the program name).
    pub fn parse(args: &[String]) -> Result<Self, ApiError> {
        let mut db_path = None;
        let mut config_path = None;
        let mut positional: Vec<&str> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--db" | "-d" => {
                    let value = args
                        .get(i + 1)
                        .ok_or_else(|| ApiError::validation("--db needs a path"))?;
                    db_path = Some(PathBuf::from(value));
                    i += 1;
                }
                "--config" | "-c" => {
                    let value = args
                        .get(i + 1)
                        .ok_or_else(|| ApiError::validation("--config needs a path"))?;
                    config_path = Some(PathBuf::from(value));
                    i += 1;
                }
                "--help" | "-h" => {
                    return Ok(CliArgs {
                        command: CliCommand::Help,
                        db_path,
                        config_path,
                    })
                }
                other => positional.push(other),
            }
            i += 1;
        }

        let command = match positional.as_slice() {
            [] => CliCommand::Help,
            ["totals", file] => CliCommand::Totals {
                file: PathBuf::from(file),
            },
            ["save", file] => CliCommand::Save {
                file: PathBuf::from(file),
            },
            ["search", words @ ..] if !words.is_empty() => CliCommand::Search {
                query: words.join(" "),
            },
            ["stock"] => CliCommand::Stock,
            ["dashboard"] => CliCommand::Dashboard,
            [name, ..] => {
                return Err(ApiError::validation(format!(
                    "Unknown or incomplete command: {}",
                    name
                )))
            }
        };

        Ok(CliArgs {
            command,
            db_path,
            config_path,
        })
    }
}

/// Parses `args`, loads config and runs one command.
pub async fn run(args: Vec<String>) -> Result<(), ApiError> {
    let cli = CliArgs::parse(&args)?;

    if cli.command == CliCommand::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config_path.clone())?;
    if let Some(path) = cli.db_path.clone() {
        config.database_path = Some(path);
    }

    match cli.command {
        CliCommand::Help => {}
        CliCommand::Totals { file } => {
            let document = read_document(&file)?;
            print!("{}", render_totals(&document, &config));
        }
        CliCommand::Save { file } => {
            let document = read_document(&file)?;
            validate_for_submission(&document)?;
            let payload = build_payload(&document);

            let app = App::open(config).await?;
            let response = record_payload(&app.db, &app.config, &payload).await?;
            println!(
                "✓ Saved {:?} {} ({} lines, {})",
                response.kind,
                response.invoice_number,
                response.line_count,
                response.grand_total_display
            );
            println!("  id: {}", response.id);
            app.db.inner().close().await;
        }
        CliCommand::Search { query } => {
            let app = App::open(config).await?;
            print!("{}", render_search(&app, &query));
            app.db.inner().close().await;
        }
        CliCommand::Stock => {
            let app = App::open(config).await?;
            let summaries = commands::medicine_summary(&app.db).await?;
            print!("{}", render_stock(&summaries, &app.config));
            app.db.inner().close().await;
        }
        CliCommand::Dashboard => {
            let app = App::open(config).await?;
            let view = commands::dashboard(&app.db, &app.config).await?;
            print!("{}", render_dashboard(&view));
            app.db.inner().close().await;
        }
    }

    Ok(())
}

fn read_document(path: &Path) -> Result<Document, ApiError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ApiError::validation(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let document: Document = serde_json::from_str(&contents).map_err(|e| {
        ApiError::validation(format!("Invalid document {}: {}", path.display(), e))
    })?;
    info!(path = %path.display(), lines = document.lines.len(), "Document loaded");
    Ok(document)
}

/// Renders the priced rows and the summary block as plain text.
pub fn render_totals(document: &Document, config: &AppConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<28} {:>8} {:>12} {:>12} {:>14}",
        "#", "Medicine", "Qty", "Net unit", "Tax", "Total"
    );

    let results = compute_lines(document);
    for (index, line) in document.non_empty_lines() {
        let result = &results[index];
        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:>8} {:>12} {:>12} {:>14}",
            index + 1,
            line.medicine_name.trim(),
            result.quantity,
            config.format_currency(result.net_unit_incl_tax),
            config.format_currency(result.tax_amount),
            config.format_currency(result.row_total),
        );
    }

    let totals = TotalsView::new(&compute_document_totals(document), config);
    let _ = writeln!(out);
    let _ = writeln!(out, "{:>58} {:>14}", "Subtotal", totals.subtotal_display);
    let _ = writeln!(out, "{:>58} {:>14}", "Tax", totals.tax_total_display);
    let _ = writeln!(out, "{:>58} {:>14}", "Grand total", totals.grand_total_display);
    out
}

fn render_search(app: &App, query: &str) -> String {
    let limit = app.config.suggestion_limit;
    let mut out = String::new();

    app.catalog.with_catalog(|catalog| {
        let medicines = catalog.search_medicines(query, limit);
        let _ = writeln!(out, "Medicines ({}):", medicines.len());
        for medicine in &medicines {
            let _ = writeln!(
                out,
                "  {:<32} tax {:>5}%  stock {:>5}  {}",
                medicine.name,
                medicine.effective_tax_rate(),
                medicine.stock_on_hand(),
                medicine.id
            );
        }

        for (label, parties) in [
            ("Suppliers", catalog.search_suppliers(query, limit)),
            ("Customers", catalog.search_customers(query, limit)),
        ] {
            let _ = writeln!(out, "{} ({}):", label, parties.len());
            for party in &parties {
                let _ = writeln!(out, "  {:<32} {}", party.name, party.id);
            }
        }
    });

    out
}

/// One line per medicine: units, level, earliest expiry and top prices.
pub fn render_stock(summaries: &[MedicineSummary], config: &AppConfig) -> String {
    let thresholds = &config.stock_thresholds;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32} {:>7} {:<9} {:<10} {:>12} {:>12}",
        "Medicine", "Units", "Level", "Expiry", "Max rate", "Max MRP"
    );

    let price = |value: Option<f64>| value.map(|v| config.format_currency(v)).unwrap_or_default();
    for summary in summaries {
        let level = if thresholds.is_low(summary.total_quantity) {
            format!("{:?}", thresholds.level(summary.total_quantity)).to_lowercase()
        } else {
            String::new()
        };
        let expiry = summary
            .earliest_expiry
            .map(|d| d.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<32} {:>7} {:<9} {:<10} {:>12} {:>12}",
            summary.name,
            summary.total_quantity,
            level,
            expiry,
            price(summary.max_purchase_rate),
            price(summary.max_mrp),
        );
    }
    out
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let summary = &view.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Medicines      {}", summary.medicine_count);
    let _ = writeln!(out, "Low stock      {}", summary.low_stock_count);
    let _ = writeln!(out, "Expiring soon  {}", summary.expiring_soon);
    let _ = writeln!(out, "Sales          {}", view.total_sales_display);
    let _ = writeln!(out, "Purchases      {}", view.total_purchases_display);

    let _ = writeln!(out);
    let _ = writeln!(out, "Low stock ({}):", view.low_stock.len());
    for item in &view.low_stock {
        let level = format!("{:?}", item.level).to_lowercase();
        let _ = writeln!(out, "  {:<32} {:>7}  {}", item.name, item.stock, level);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Recent ({}):", view.recent.len());
    for activity in &view.recent {
        let entry = &activity.entry;
        let _ = writeln!(
            out,
            "  {:<9} {:<14} {:<24} {:>14}",
            format!("{:?}", entry.kind),
            entry.invoice_number,
            entry.party_name.as_deref().unwrap_or("-"),
            activity.grand_total_display,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use medibill_core::stock::{ActivityEntry, DashboardSummary, LowStockItem, StockLevel};
    use medibill_core::{DocumentKind, LineItem, TaxMode};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_totals() {
        let cli = CliArgs::parse(&args(&["totals", "bill.json"])).unwrap();
        assert_eq!(
            cli.command,
            CliCommand::Totals {
                file: PathBuf::from("bill.json")
            }
        );
        assert!(cli.db_path.is_none());
    }

    #[test]
    fn test_parse_options_anywhere() {
        let cli =
            CliArgs::parse(&args(&["--db", "dev.db", "save", "bill.json", "-c", "x.toml"]))
                .unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("dev.db")));
        assert_eq!(cli.config_path, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, CliCommand::Save { .. }));
    }

    #[test]
    fn test_parse_search_joins_words() {
        let cli = CliArgs::parse(&args(&["search", "dolo", "650"])).unwrap();
        assert_eq!(
            cli.command,
            CliCommand::Search {
                query: "dolo 650".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliArgs::parse(&args(&["totals"])).is_err());
        assert!(CliArgs::parse(&args(&["print", "x"])).is_err());
        assert!(CliArgs::parse(&args(&["--db"])).is_err());
        assert!(CliArgs::parse(&args(&["stock", "all"])).is_err());
        assert_eq!(CliArgs::parse(&[]).unwrap().command, CliCommand::Help);
    }

    #[test]
    fn test_render_totals() {
        let document = Document::purchase()
            .with_line(LineItem::new("Dolo 650", 100.0, 10.5))
            .with_line(LineItem::default());
        let out = render_totals(&document, &AppConfig::default());

        assert!(out.contains("Dolo 650"));
        assert!(out.contains("₹1050.00"));
        assert!(out.contains("₹52.50"));
        assert!(out.contains("₹1102.50"));
        assert_eq!(out.lines().filter(|l| l.contains("Dolo")).count(), 1);
    }

    #[test]
    fn test_render_totals_inclusive() {
        let document = Document::sale()
            .with_tax_mode(TaxMode::Inclusive)
            .with_line(LineItem::new("Dolo 650", 100.0, 10.5));
        let out = render_totals(&document, &AppConfig::default());

        assert!(out.contains("₹1000.00"));
        assert!(out.contains("₹50.00"));
        assert!(out.contains("₹1050.00"));
    }

    #[test]
    fn test_parse_report_commands() {
        assert_eq!(CliArgs::parse(&args(&["stock"])).unwrap().command, CliCommand::Stock);
        let cli = CliArgs::parse(&args(&["-d", "shop.db", "dashboard"])).unwrap();
        assert_eq!(cli.command, CliCommand::Dashboard);
        assert_eq!(cli.db_path, Some(PathBuf::from("shop.db")));
    }

    #[test]
    fn test_render_stock() {
        let summaries = [
            MedicineSummary {
                id: "m1".to_string(),
                name: "Paracetamol 500".to_string(),
                brand: None,
                total_quantity: 8,
                earliest_expiry: NaiveDate::from_ymd_opt(2026, 12, 31),
                max_purchase_rate: Some(15.5),
                max_mrp: Some(22.0),
            },
            MedicineSummary {
                id: "m2".to_string(),
                name: "Azithral 500".to_string(),
                brand: None,
                total_quantity: 120,
                earliest_expiry: None,
                max_purchase_rate: None,
                max_mrp: None,
            },
        ];
        let out = render_stock(&summaries, &AppConfig::default());

        let para = out.lines().find(|l| l.starts_with("Paracetamol")).unwrap();
        assert!(para.contains("critical"));
        assert!(para.contains("2026-12-31"));
        assert!(para.contains("₹15.50"));
        let azi = out.lines().find(|l| l.starts_with("Azithral")).unwrap();
        assert!(!azi.contains("critical") && !azi.contains("ok"));
    }

    #[test]
    fn test_render_dashboard() {
        let view = DashboardView {
            summary: DashboardSummary {
                medicine_count: 2,
                low_stock_count: 1,
                expiring_soon: 3,
                total_sales: 40.0,
                total_purchases: 1750.0,
            },
            total_sales_display: "₹40.00".to_string(),
            total_purchases_display: "₹1750.00".to_string(),
            low_stock: vec![LowStockItem {
                medicine_id: "m1".to_string(),
                name: "Paracetamol 500".to_string(),
                stock: 22,
                level: StockLevel::Warning,
            }],
            recent: vec![commands::ActivityView {
                entry: ActivityEntry {
                    kind: DocumentKind::Sale,
                    id: "x1".to_string(),
                    invoice_number: "B-201".to_string(),
                    party_name: None,
                    grand_total: 40.0,
                    created_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
                },
                grand_total_display: "₹40.00".to_string(),
            }],
        };
        let out = render_dashboard(&view);

        assert!(out.contains("Expiring soon  3"));
        assert!(out.contains("Purchases      ₹1750.00"));
        assert!(out.lines().any(|l| l.contains("Paracetamol 500") && l.ends_with("warning")));
        assert!(out.lines().any(|l| l.contains("Sale") && l.contains("B-201")));
    }
}
