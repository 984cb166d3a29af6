//! End-to-end: type a draft through the commands and save it.

use chrono::NaiveDate;
use medibill_core::navigation::{GridCursor, NavKey};
use medibill_core::{Batch, DocumentKind, LineField, Medicine, Party, PurchaseType, StockLevel};
use medibill_db::{Database, DbConfig, PartyRole};
use medibill_desk_lib::commands::{self, HeaderUpdate};
use medibill_desk_lib::error::ErrorCode;
use medibill_desk_lib::state::AppConfig;
use medibill_desk_lib::App;

async fn open_app() -> App {
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
        .insert(&Medicine::new("m1", "Dolo 650").with_tax_rate(12.0))
        .await
        .unwrap();

    let mut batch = Batch::new("b1", "m1", "D12");
    batch.quantity = 40;
    db.medicines().insert_batch(&batch).await.unwrap();

    App::with_database(AppConfig::default(), db).await.unwrap()
}

#[tokio::test]
async fn purchase_is_saved_and_draft_reset() {
    let app = open_app().await;
    let (catalog, draft, config) = (&app.catalog, &app.draft, &app.config);

    commands::new_draft(draft, config, DocumentKind::Purchase);
    commands::choose_party(catalog, draft, config, "s1").unwrap();
    commands::update_header(
        draft,
        config,
        HeaderUpdate {
            invoice_number: Some("INV-1".to_string()),
            date: Some("2026-10-16".to_string()),
            ..HeaderUpdate::default()
        },
    )
    .unwrap();

    commands::choose_medicine(catalog, draft, config, 0, "m1").unwrap();
    commands::choose_batch(catalog, draft, config, 0, "D12").unwrap();
    commands::edit_field(draft, config, 0, "quantity", "10").unwrap();
    commands::edit_field(draft, config, 0, "unit_price", "100").unwrap();

    commands::edit_field(draft, config, 1, "medicine_name", "Shelcal 500").unwrap();
    commands::edit_field(draft, config, 1, "batch", "SH-7").unwrap();
    commands::edit_field(draft, config, 1, "expiry", "31082027").unwrap();
    commands::edit_field(draft, config, 1, "quantity", "20").unwrap();
    let view = commands::edit_field(draft, config, 1, "unit_price", "30").unwrap();

    // Editing the last row appended a fresh empty one.
    assert_eq!(view.rows.len(), 3);
    assert_eq!(view.totals.grand_total_display, "₹1750.00");

    let saved = commands::save_draft(&app.db, catalog, draft, config).await.unwrap();
    assert_eq!(saved.kind, DocumentKind::Purchase);
    assert_eq!(saved.line_count, 2);
    assert_eq!(saved.grand_total, 1750.0);

    let after = commands::get_draft(draft, config);
    assert_eq!(after.invoice_number, "");
    assert_eq!(after.rows.len(), 2);
    assert!(after.rows.iter().all(|r| r.line.is_empty()));

    let batch = app.db.inner().medicines().find_batch("m1", "D12").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 50);

    // The new medicine is searchable straight away.
    let found = commands::search_medicines(catalog, config, "shel");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].stock_on_hand(), 20);

    let record = app.db.inner().purchases().get_by_id(&saved.id).await.unwrap().unwrap();
    assert_eq!(record.purchase_type, PurchaseType::Purchase);
    assert_eq!(record.supplier_id, "s1");
}

#[tokio::test]
async fn sale_with_discount_decrements_stock() {
    let app = open_app().await;
    let (catalog, draft, config) = (&app.catalog, &app.draft, &app.config);

    commands::new_draft(draft, config, DocumentKind::Sale);
    commands::choose_party(catalog, draft, config, "c1").unwrap();
    commands::update_header(
        draft,
        config,
        HeaderUpdate {
            invoice_number: Some("B-1".to_string()),
            ..HeaderUpdate::default()
        },
    )
    .unwrap();

    commands::choose_medicine(catalog, draft, config, 0, "m1").unwrap();
    commands::choose_batch(catalog, draft, config, 0, "D12").unwrap();
    commands::edit_field(draft, config, 0, "quantity", "4").unwrap();
    commands::edit_field(draft, config, 0, "unit_price", "50").unwrap();
    let view = commands::edit_field(draft, config, 0, "discount", "10").unwrap();

    // 4 × 50 × 0.9 = 180, +12% = 201.60
    assert_eq!(view.totals.grand_total_display, "₹201.60");

    let saved = commands::save_draft(&app.db, catalog, draft, config).await.unwrap();
    assert_eq!(saved.grand_total, 201.6);

    let batch = app.db.inner().medicines().find_batch("m1", "D12").await.unwrap().unwrap();
    assert_eq!(batch.quantity, 36);
}

#[tokio::test]
async fn invalid_draft_is_kept_for_fixing() {
    let app = open_app().await;
    let (catalog, draft, config) = (&app.catalog, &app.draft, &app.config);

    commands::new_draft(draft, config, DocumentKind::Purchase);
    commands::edit_field(draft, config, 0, "medicine_name", "Dolo 650").unwrap();
    commands::edit_field(draft, config, 0, "quantity", "5").unwrap();

    let err = commands::save_draft(&app.db, catalog, draft, config).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "invoice_number is required");

    let view = commands::get_draft(draft, config);
    assert_eq!(view.rows[0].line.medicine_name, "Dolo 650");
    assert!(app.db.inner().purchases().list_recent(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn config_file_is_loaded() {
    let path = std::env::temp_dir().join(format!("medibill-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        "currency_symbol = \"Rs.\"\ntax_mode = \"inclusive\"\ninitial_rows = 4\n",
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.currency_symbol, "Rs.");
    assert_eq!(config.initial_rows, 4);
    assert_eq!(config.format_currency(12.5), "Rs.12.50");

    let draft = config.new_draft(DocumentKind::Sale);
    assert_eq!(draft.rows().len(), 4);
}

async fn save_sale(app: &App, quantity: &str) -> commands::SaveResponse {
    let (catalog, draft, config) = (&app.catalog, &app.draft, &app.config);

    commands::new_draft(draft, config, DocumentKind::Sale);
    commands::choose_party(catalog, draft, config, "c1").unwrap();
    commands::update_header(
        draft,
        config,
        HeaderUpdate {
            invoice_number: Some("B-7".to_string()),
            ..HeaderUpdate::default()
        },
    )
    .unwrap();
    commands::choose_medicine(catalog, draft, config, 0, "m1").unwrap();
    commands::choose_batch(catalog, draft, config, 0, "D12").unwrap();
    commands::edit_field(draft, config, 0, "quantity", quantity).unwrap();
    commands::edit_field(draft, config, 0, "unit_price", "50").unwrap();

    commands::save_draft(&app.db, catalog, draft, config).await.unwrap()
}

#[tokio::test]
async fn keyboard_entry_picks_medicine_from_dropdown() {
    let app = open_app().await;
    let (catalog, draft, config) = (&app.catalog, &app.draft, &app.config);
    commands::new_draft(draft, config, DocumentKind::Sale);

    let list = commands::suggest_medicines(catalog, &app.form, config, 0, "dolo");
    assert_eq!(list.items.len(), 1);

    commands::navigate_suggestions(catalog, draft, &app.form, config, NavKey::ArrowDown).unwrap();
    let picked =
        commands::navigate_suggestions(catalog, draft, &app.form, config, NavKey::Enter).unwrap();
    let commands::NavigationResponse::Selected { draft: view, cursor } = picked else {
        panic!("expected Dolo 650 to be picked");
    };
    assert_eq!(view.rows[0].line.medicine_id.as_deref(), Some("m1"));
    assert_eq!(cursor.field(), LineField::Batch);

    let cursor = commands::move_cursor(draft, &app.form, NavKey::ArrowRight);
    assert_eq!(cursor.field(), LineField::Expiry);

    commands::suggest_medicines(catalog, &app.form, config, 1, "dolo");
    commands::new_draft(draft, config, DocumentKind::Sale);
    let cursor = commands::reset_form(&app.form);
    assert_eq!(cursor, GridCursor::new(0, 0));
    let closed =
        commands::navigate_suggestions(catalog, draft, &app.form, config, NavKey::Enter).unwrap();
    assert!(matches!(closed, commands::NavigationResponse::Closed));
}

#[tokio::test]
async fn party_maintenance_updates_autocomplete_and_draft() {
    let app = open_app().await;
    let (catalog, draft, config) = (&app.catalog, &app.draft, &app.config);
    commands::new_draft(draft, config, DocumentKind::Sale);

    let created = commands::save_party(
        &app.db,
        catalog,
        DocumentKind::Sale,
        Party::new("", "Meera Stores"),
    )
    .await
    .unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(commands::search_parties(catalog, draft, config, "meera").len(), 1);

    let err = commands::save_party(&app.db, catalog, DocumentKind::Sale, Party::new("", "  "))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "Customer name is required");

    let mut renamed = Party::new("c1", "Ravi Kumar Jr");
    renamed.phone = Some("98450 12345".to_string());
    commands::save_party(&app.db, catalog, DocumentKind::Sale, renamed).await.unwrap();
    assert_eq!(commands::search_parties(catalog, draft, config, "jr")[0].id, "c1");

    commands::choose_party(catalog, draft, config, "c1").unwrap();
    commands::delete_party(&app.db, catalog, draft, DocumentKind::Sale, "c1")
        .await
        .unwrap();

    let view = commands::get_draft(draft, config);
    assert_eq!(view.party_id, None);
    assert_eq!(view.party_name, "");
    assert!(commands::search_parties(catalog, draft, config, "ravi").is_empty());

    let err = commands::delete_party(&app.db, catalog, draft, DocumentKind::Sale, "c1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn customer_on_a_saved_sale_is_kept() {
    let app = open_app().await;
    save_sale(&app, "2").await;

    let err = commands::delete_party(&app.db, &app.catalog, &app.draft, DocumentKind::Sale, "c1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(
        err.message,
        "Customer c1 appears on recorded invoices and cannot be deleted"
    );
    assert_eq!(app.db.inner().parties().count(PartyRole::Customer).await.unwrap(), 1);
}

#[tokio::test]
async fn dashboard_after_a_sale() {
    let app = open_app().await;
    let saved = save_sale(&app, "15").await;

    // 15 × 50 = 750, +12% = 840
    assert_eq!(saved.grand_total, 840.0);

    let summaries = commands::medicine_summary(&app.db).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_quantity, 25);

    let alerts = commands::low_stock_alerts(&app.db, &app.config).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, StockLevel::Warning);

    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let view = commands::dashboard_on(&app.db, &app.config, today).await.unwrap();
    assert_eq!(view.summary.medicine_count, 1);
    assert_eq!(view.summary.low_stock_count, 1);
    assert_eq!(view.summary.expiring_soon, 0);
    assert_eq!(view.total_sales_display, "₹840.00");
    assert_eq!(view.total_purchases_display, "₹0.00");
    assert_eq!(view.recent.len(), 1);
    assert_eq!(view.recent[0].entry.party_name.as_deref(), Some("Ravi Kumar"));
    assert_eq!(view.recent[0].grand_total_display, "₹840.00");
}
