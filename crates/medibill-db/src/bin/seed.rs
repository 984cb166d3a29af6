//! # Seed Data Generator
//!
//! Populates the database with a small pharmacy catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p medibill-db --bin seed
//!
//! # Specify database path
//! cargo run -p medibill-db --bin seed -- --db ./data/medibill.db
//!
//! # Number of batches per medicine
//! cargo run -p medibill-db --bin seed -- --batches 3
//! ```
//!
//! ## Generated Data
//! - Medicines with GST rates of 0%, 5%, 12% and 18%; a few carry no rate
//!   so the form falls back to its default
//! - Batches per medicine with expiry, MRP, purchase rate and stock
//! - Suppliers (distributors) and walk-in customers

use chrono::{Months, NaiveDate};
use medibill_core::catalog::{Batch, Medicine, Party};
use medibill_db::{Database, DbConfig, PartyRole};
use std::env;
use uuid::Uuid;

/// (name, brand, GST rate, MRP)
const MEDICINES: &[(&str, &str, Option<f64>, f64)] = &[
    ("Paracetamol 500mg", "Crocin", Some(12.0), 30.0),
    ("Paracetamol 650mg", "Dolo", Some(12.0), 32.0),
    ("Amoxicillin 500mg", "Mox", Some(12.0), 85.0),
    ("Augmentin 625 Duo", "GSK", Some(12.0), 220.0),
    ("Azithromycin 500mg", "Azithral", Some(12.0), 120.0),
    ("Cetirizine 10mg", "Okacet", Some(12.0), 18.0),
    ("Pantoprazole 40mg", "Pan", Some(12.0), 155.0),
    ("Metformin 500mg", "Glycomet", Some(12.0), 45.0),
    ("Amlodipine 5mg", "Amlong", Some(12.0), 60.0),
    ("Atorvastatin 10mg", "Atorva", Some(12.0), 110.0),
    ("Insulin Glargine", "Lantus", Some(5.0), 780.0),
    ("Oral Rehydration Salts", "Electral", Some(5.0), 22.0),
    ("Cough Syrup 100ml", "Benadryl", Some(18.0), 125.0),
    ("Vitamin C Chewable", "Limcee", Some(18.0), 25.0),
    ("Calcium + D3", "Shelcal", Some(18.0), 130.0),
    ("Hand Sanitizer 500ml", "Dettol", Some(18.0), 250.0),
    ("Antiseptic Liquid 250ml", "Savlon", None, 110.0),
    ("Cotton Roll 100g", "Generic", Some(0.0), 40.0),
    ("Crepe Bandage 10cm", "Generic", None, 95.0),
    ("Digital Thermometer", "Omron", Some(18.0), 299.0),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Apex Pharma Distributors", "27AAACA1234F1Z5"),
    ("Sunrise Medical Agencies", "27AAFCS5678K1Z2"),
    ("City Drug House", "27AABCC9012M1ZQ"),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Walk-in Customer", "0000000000"),
    ("Ravi Kumar", "9876543210"),
    ("Anita Sharma", "9123456780"),
    ("Dr. Mehta Clinic", "9988776655"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut batches_per_medicine: usize = 2;
    let mut db_path = String::from("./medibill_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--batches" | "-b" => {
                if i + 1 < args.len() {
                    batches_per_medicine = args[i + 1].parse().unwrap_or(2);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("MediBill Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --batches <N>  Batches per medicine (default: 2)");
                println!("  -d, --db <PATH>    Database file path (default: ./medibill_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MediBill Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Batches per medicine: {}", batches_per_medicine);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.medicines().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} medicines", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let start = std::time::Instant::now();
    let base_expiry = NaiveDate::from_ymd_opt(2027, 1, 31).unwrap_or_default();
    let mut medicines = 0;
    let mut batches = 0;

    for (idx, (name, brand, tax_rate, mrp)) in MEDICINES.iter().enumerate() {
        let medicine = Medicine {
            sku: Some(format!("MED-{:04}", idx + 1)),
            brand: Some(brand.to_string()),
            tax_rate: *tax_rate,
            ..Medicine::new(Uuid::new_v4().to_string(), *name)
        };

        if let Err(e) = db.medicines().insert(&medicine).await {
            eprintln!("Failed to insert {}: {}", medicine.name, e);
            continue;
        }
        medicines += 1;

        for batch_idx in 0..batches_per_medicine {
            let batch = generate_batch(&medicine.id, brand, *mrp, base_expiry, idx, batch_idx);
            if let Err(e) = db.medicines().insert_batch(&batch).await {
                eprintln!("Failed to insert batch {}: {}", batch.batch_no, e);
                continue;
            }
            batches += 1;
        }
    }

    println!("✓ {} medicines, {} batches", medicines, batches);

    println!();
    println!("Generating parties...");

    for (idx, (name, gstin)) in SUPPLIERS.iter().enumerate() {
        let supplier = Party {
            gstin: Some(gstin.to_string()),
            phone: Some(format!("02240{:05}", idx + 1)),
            ..Party::new(Uuid::new_v4().to_string(), *name)
        };
        db.parties().insert(PartyRole::Supplier, &supplier).await?;
    }

    for (name, phone) in CUSTOMERS {
        let customer = Party {
            phone: Some(phone.to_string()),
            ..Party::new(Uuid::new_v4().to_string(), *name)
        };
        db.parties().insert(PartyRole::Customer, &customer).await?;
    }

    println!(
        "✓ {} suppliers, {} customers",
        db.parties().count(PartyRole::Supplier).await?,
        db.parties().count(PartyRole::Customer).await?
    );

    println!();
    println!("Completed in {:?}", start.elapsed());

    // Verify search
    println!();
    println!("Verifying search...");
    let results = db.medicines().search("para", 10).await?;
    println!("  Search 'para': {} results", results.len());
    let results = db.parties().search(PartyRole::Supplier, "pharma", 10).await?;
    println!("  Search suppliers 'pharma': {} results", results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one stock lot. Later batches expire later and cost a bit more.
fn generate_batch(
    medicine_id: &str,
    brand: &str,
    mrp: f64,
    base_expiry: NaiveDate,
    medicine_idx: usize,
    batch_idx: usize,
) -> Batch {
    let prefix: String = brand
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    let months = (medicine_idx % 12 + batch_idx * 6) as u32;
    let expiry = base_expiry.checked_add_months(Months::new(months));

    // Purchase rate is 65-80% of MRP
    let margin = 0.65 + ((medicine_idx + batch_idx) % 4) as f64 * 0.05;
    let purchase_rate = (mrp * margin * 100.0).round() / 100.0;

    Batch {
        expiry,
        mrp: Some(mrp),
        purchase_rate: Some(purchase_rate),
        quantity: ((medicine_idx * 7 + batch_idx * 13) % 90 + 10) as i64,
        ..Batch::new(
            Uuid::new_v4().to_string(),
            medicine_id,
            format!("{}{:02}{:02}", prefix, medicine_idx + 1, batch_idx + 1),
        )
    }
}
