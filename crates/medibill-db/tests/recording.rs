//! Purchase and sale recording against an in-memory database.

use chrono::NaiveDate;
use medibill_core::catalog::{Batch, Medicine, Party};
use medibill_core::payload::{build_payload, validate_for_submission, SubmissionPayload};
use medibill_core::stock::StockThresholds;
use medibill_core::{Document, DocumentKind, LineItem, PurchaseType, TaxMode};
use medibill_db::{Database, DbConfig, DbError, PartyRole};

async fn seeded_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.parties()
        .insert(PartyRole::Supplier, &Party::new("s1", "Apex Pharma"))
        .await
        .unwrap();
    db.parties()
        .insert(PartyRole::Customer, &Party::new("c1", "Ravi Kumar"))
        .await
        .unwrap();

    db.medicines()
        .insert(&Medicine::new("m1", "Augmentin 625").with_tax_rate(12.0))
        .await
        .unwrap();

    let mut batch = Batch::new("b1", "m1", "AUG-01");
    batch.quantity = 5;
    db.medicines().insert_batch(&batch).await.unwrap();

    db
}

fn purchase_doc() -> Document {
    let mut doc = Document::purchase()
        .with_line(
            LineItem::new("Augmentin 625", 10.0, 100.0)
                .with_medicine_id("m1")
                .with_batch("AUG-01")
                .with_tax_rate(12.0),
        )
        .with_line(LineItem {
            expiry: NaiveDate::from_ymd_opt(2027, 8, 31),
            mrp: Some(45.0),
            ..LineItem::new("Shelcal 500", 20.0, 30.0).with_batch("SH-7")
        })
        .with_line(LineItem::default());
    doc.invoice_number = "INV-9001".to_string();
    doc.party_id = Some("s1".to_string());
    doc.date = NaiveDate::from_ymd_opt(2026, 10, 1);
    doc
}

fn purchase_payload(doc: &Document) -> medibill_core::payload::PurchasePayload {
    validate_for_submission(doc).unwrap();
    match build_payload(doc) {
        SubmissionPayload::Purchase(p) => p,
        SubmissionPayload::Sale(_) => panic!("expected purchase payload"),
    }
}

#[tokio::test]
async fn purchase_adds_stock_and_creates_missing_catalog_rows() {
    let db = seeded_db().await;
    let payload = purchase_payload(&purchase_doc());

    let record = db.purchases().record(&payload).await.unwrap();
    assert_eq!(record.item_count, 2);
    assert_eq!(record.grand_total, 1750.0);

    let existing = db.medicines().find_batch("m1", "AUG-01").await.unwrap().unwrap();
    assert_eq!(existing.quantity, 15);

    let created = db.medicines().find_or_create_by_name("shelcal 500").await.unwrap();
    let batch = db.medicines().find_batch(&created.id, "SH-7").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 20);
    assert_eq!(batch.expiry, NaiveDate::from_ymd_opt(2027, 8, 31));
    assert_eq!(batch.mrp, Some(45.0));
    assert_eq!(batch.purchase_rate, Some(31.5));
    assert_eq!(db.medicines().count().await.unwrap(), 2);

    let stored = db.purchases().get_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(stored.invoice_number, "INV-9001");
    assert_eq!(stored.purchase_date, NaiveDate::from_ymd_opt(2026, 10, 1));
    assert_eq!(stored.tax_mode, TaxMode::Exclusive);
    assert_eq!(stored.item_count, 2);

    let items = db.purchases().items(&record.id).await.unwrap();
    assert_eq!(items[0].net_unit_price, 112.0);
    assert_eq!(items[0].row_total, 1120.0);
}

#[tokio::test]
async fn stock_update_also_adds_stock() {
    let db = seeded_db().await;
    let mut doc = purchase_doc();
    doc.purchase_type = PurchaseType::StockUpdate;

    let record = db.purchases().record(&purchase_payload(&doc)).await.unwrap();
    assert_eq!(record.purchase_type, PurchaseType::StockUpdate);

    let batch = db.medicines().find_batch("m1", "AUG-01").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 15);
    assert_eq!(db.purchases().list_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_supplier_rolls_back_everything() {
    let db = seeded_db().await;
    let mut doc = purchase_doc();
    doc.party_id = Some("s-missing".to_string());

    let err = db.purchases().record(&purchase_payload(&doc)).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Supplier"));

    let batch = db.medicines().find_batch("m1", "AUG-01").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 5);
    assert!(db.purchases().list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_medicine_id_rolls_back_earlier_lines() {
    let db = seeded_db().await;
    let mut doc = purchase_doc();
    doc.lines[1].medicine_id = Some("m-missing".to_string());

    let err = db.purchases().record(&purchase_payload(&doc)).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Medicine"));

    let batch = db.medicines().find_batch("m1", "AUG-01").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 5);
    assert_eq!(db.medicines().count().await.unwrap(), 1);
}

#[tokio::test]
async fn sale_decrements_known_batches() {
    let db = seeded_db().await;

    let mut doc = Document::sale()
        .with_line(
            LineItem::new("Augmentin 625", 3.0, 100.0)
                .with_medicine_id("m1")
                .with_batch("AUG-01")
                .with_discount(10.0),
        )
        .with_line(LineItem::new("Loose cotton", 1.0, 20.0));
    doc.invoice_number = "B-101".to_string();
    doc.party_id = Some("c1".to_string());

    validate_for_submission(&doc).unwrap();
    let SubmissionPayload::Sale(payload) = build_payload(&doc) else {
        panic!("expected sale payload");
    };

    let record = db.sales().record(&payload).await.unwrap();
    assert_eq!(record.customer_id.as_deref(), Some("c1"));
    assert_eq!(record.item_count, 2);

    let batch = db.medicines().find_batch("m1", "AUG-01").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 2);

    let stored = db.sales().get_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(stored.grand_total, payload.grand_total);
    assert_eq!(db.sales().list_recent(5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sale_with_unknown_customer_fails() {
    let db = seeded_db().await;

    let mut doc = Document::sale().with_line(LineItem::new("ORS", 1.0, 20.0));
    doc.invoice_number = "B-102".to_string();
    doc.party_id = Some("c-missing".to_string());

    let SubmissionPayload::Sale(payload) = build_payload(&doc) else {
        panic!("expected sale payload");
    };
    let err = db.sales().record(&payload).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
}

#[tokio::test]
async fn party_on_a_recorded_invoice_cannot_be_deleted() {
    let db = seeded_db().await;
    db.purchases().record(&purchase_payload(&purchase_doc())).await.unwrap();

    let err = db.parties().delete(PartyRole::Supplier, "s1").await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    assert!(db.parties().get_by_id(PartyRole::Supplier, "s1").await.unwrap().is_some());

    db.parties().delete(PartyRole::Customer, "c1").await.unwrap();
}

#[tokio::test]
async fn dashboard_reflects_recorded_invoices() {
    let db = seeded_db().await;
    let purchase = db.purchases().record(&purchase_payload(&purchase_doc())).await.unwrap();

    let mut restock = purchase_doc();
    restock.invoice_number = "ADJ-1".to_string();
    restock.purchase_type = PurchaseType::StockUpdate;
    db.purchases().record(&purchase_payload(&restock)).await.unwrap();

    let mut doc = Document::sale().with_line(LineItem::new("ORS", 2.0, 20.0));
    doc.invoice_number = "B-201".to_string();
    let SubmissionPayload::Sale(payload) = build_payload(&doc) else {
        panic!("expected sale payload");
    };
    let sale = db.sales().record(&payload).await.unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let summary = db
        .reports()
        .dashboard(today, &StockThresholds::default(), 365)
        .await
        .unwrap();
    assert_eq!(summary.medicine_count, 2);
    assert_eq!(summary.total_purchases, purchase.grand_total);
    assert_eq!(summary.total_sales, sale.grand_total);
    assert_eq!(summary.expiring_soon, 1);

    let feed = db.reports().recent_activity(10).await.unwrap();
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].kind, DocumentKind::Sale);
    assert_eq!(feed[0].party_name, None);
    assert_eq!(feed[2].party_name.as_deref(), Some("Apex Pharma"));
    assert_eq!(db.reports().recent_activity(1).await.unwrap().len(), 1);
}
