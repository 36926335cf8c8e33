mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use orderdesk_api::{
    cart::CartEntryInput,
    export::ExportLayout,
    ledger::{CsvLedger, DateRange, OrderLedger},
    services::SubmitOrderInput,
};
use serde_json::json;

fn entry(code: &str, quantity: &str) -> CartEntryInput {
    CartEntryInput {
        item_code: code.to_string(),
        quantity: json!(quantity),
    }
}

#[tokio::test]
async fn orders_round_trip_through_ledger_file_and_export() {
    let app = TestApp::with_csv_ledger();

    app.state
        .services
        .orders
        .submit(SubmitOrderInput {
            customer_number: "1001".to_string(),
            delivery_date: None,
            entries: vec![entry("A2", "1.5"), entry("A1", "2")],
        })
        .await
        .expect("submit");

    // Reopen the file as a fresh ledger, as a restarted process would.
    let reopened = CsvLedger::open(app.orders_file()).expect("reopen");
    let orders = reopened.query(DateRange::default()).await.expect("query");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].customer_number, "1001");

    let csv = String::from_utf8(app.state.export_layout.to_csv(&orders).expect("csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("OrderNumber,CustomerNumber,MaterialNumber,OrderQuantity"));
    // Lines sorted by item code within the order; quantities exact.
    assert!(lines[1].starts_with("1,1001,A1,2,"));
    assert!(lines[2].starts_with("1,1001,A2,1.5,"));
    // Constant fields from the ERP contract are injected on every row.
    assert!(lines[1].contains(",ZOR,1652,01,01,1001,1001,Pepperi Backup,CS,EXO"));
}

#[tokio::test]
async fn empty_ledger_exports_header_only() {
    let app = TestApp::new();
    let orders = app
        .state
        .ledger
        .query(DateRange::default())
        .await
        .expect("query");
    let csv = String::from_utf8(app.state.export_layout.to_csv(&orders).expect("csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].split(',').count(), 14);
}

#[tokio::test]
async fn date_range_slices_on_creation_date_inclusively() {
    let app = TestApp::new();
    app.state
        .services
        .orders
        .submit(SubmitOrderInput {
            customer_number: "2002".to_string(),
            delivery_date: None,
            entries: vec![entry("B1", "1")],
        })
        .await
        .expect("submit");

    let today = Utc::now().date_naive();
    let tomorrow = today + Duration::days(1);

    let covering = DateRange {
        from: Some(today),
        to: Some(today),
    };
    assert_eq!(app.state.ledger.query(covering).await.expect("query").len(), 1);

    let future = DateRange {
        from: Some(tomorrow),
        to: None,
    };
    assert!(app.state.ledger.query(future).await.expect("query").is_empty());

    let past = DateRange {
        from: None,
        to: Some(today - Duration::days(1)),
    };
    assert!(app.state.ledger.query(past).await.expect("query").is_empty());
}

#[tokio::test]
async fn custom_layout_blank_columns_stay_present() {
    let app = TestApp::new();
    app.state
        .services
        .orders
        .submit(SubmitOrderInput {
            customer_number: "2002".to_string(),
            delivery_date: None,
            entries: vec![entry("B2", "2")],
        })
        .await
        .expect("submit");

    let columns: Vec<String> = ["OrderSequence", "MaterialNumber", "SomeUnmappedField"]
        .into_iter()
        .map(str::to_string)
        .collect();
    let layout = ExportLayout::new(&columns, &Default::default());

    let orders = app
        .state
        .ledger
        .query(DateRange::default())
        .await
        .expect("query");
    let csv = String::from_utf8(layout.to_csv(&orders).expect("csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "OrderSequence,MaterialNumber,SomeUnmappedField");
    assert_eq!(lines[1], "1,B2,");
}
