mod common;

use common::TestApp;
use orderdesk_api::{
    cart::CartEntryInput,
    errors::ServiceError,
    ledger::DateRange,
    services::SubmitOrderInput,
};
use serde_json::json;

fn entry(code: &str, quantity: &str) -> CartEntryInput {
    CartEntryInput {
        item_code: code.to_string(),
        quantity: json!(quantity),
    }
}

fn submit_input(customer: &str, entries: Vec<CartEntryInput>) -> SubmitOrderInput {
    SubmitOrderInput {
        customer_number: customer.to_string(),
        delivery_date: None,
        entries,
    }
}

#[tokio::test]
async fn sequential_serials_start_at_one_with_no_gaps() {
    let app = TestApp::new();
    let orders = &app.state.services.orders;

    for expected in 1..=4u64 {
        let receipt = orders
            .submit(submit_input("2002", vec![entry("B1", "1")]))
            .await
            .expect("submit");
        assert_eq!(receipt.order_serial, expected);
    }
}

#[tokio::test]
async fn concurrent_submissions_never_share_a_serial() {
    let app = TestApp::new();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..10 {
        let orders = app.state.services.orders.clone();
        // Alternate between two customers with no entitlement restrictions.
        let customer = if i % 2 == 0 { "2002" } else { "3003" };
        tasks.spawn(async move {
            orders
                .submit(submit_input(customer, vec![entry("B1", "1")]))
                .await
                .expect("submit")
                .order_serial
        });
    }

    let mut serials = Vec::new();
    while let Some(result) = tasks.join_next().await {
        serials.push(result.expect("task"));
    }
    serials.sort_unstable();
    assert_eq!(serials, (1..=10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn successful_submission_clears_the_cart() {
    let app = TestApp::new();
    let snapshot = app.state.catalog.snapshot();

    app.state
        .carts
        .apply_batch("1001", &[entry("A1", "2"), entry("A2", "3")], &snapshot);

    let receipt = app
        .state
        .services
        .orders
        .submit(submit_input("1001", Vec::new()))
        .await
        .expect("submit");
    assert_eq!(receipt.lines, 2);
    assert!(app.state.carts.get("1001").is_empty());

    let stored = app
        .state
        .ledger
        .query(DateRange::default())
        .await
        .expect("query");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].customer_number, "1001");
}

#[tokio::test]
async fn empty_order_is_rejected_and_cart_preserved() {
    let app = TestApp::new();
    let snapshot = app.state.catalog.snapshot();
    app.state.carts.apply_batch("1001", &[entry("A1", "2")], &snapshot);

    // The final batch zeroes out the only line.
    let err = app
        .state
        .services
        .orders
        .submit(submit_input("1001", vec![entry("A1", "0")]))
        .await
        .expect_err("must reject");
    assert!(matches!(err, ServiceError::EmptyOrder));

    // Nothing written, and the (now empty) cart state is consistent:
    // resubmitting with a positive quantity works.
    assert!(app
        .state
        .ledger
        .query(DateRange::default())
        .await
        .expect("query")
        .is_empty());

    let receipt = app
        .state
        .services
        .orders
        .submit(submit_input("1001", vec![entry("A1", "5")]))
        .await
        .expect("resubmit");
    assert_eq!(receipt.order_serial, 1);
}

#[tokio::test]
async fn unknown_or_missing_customer_rejected_without_writes() {
    let app = TestApp::new();

    let err = app
        .state
        .services
        .orders
        .submit(submit_input("9999", vec![entry("A1", "1")]))
        .await
        .expect_err("unknown customer");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .state
        .services
        .orders
        .submit(submit_input("  ", vec![entry("A1", "1")]))
        .await
        .expect_err("blank customer");
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    assert!(app
        .state
        .ledger
        .query(DateRange::default())
        .await
        .expect("query")
        .is_empty());
}

#[tokio::test]
async fn final_batch_folds_into_prior_cart_state() {
    let app = TestApp::new();
    let snapshot = app.state.catalog.snapshot();

    // Operator picked A1 earlier under one filter state...
    app.state.carts.apply_batch("1001", &[entry("A1", "2")], &snapshot);

    // ...and submits from a view that only showed A2.
    let receipt = app
        .state
        .services
        .orders
        .submit(submit_input("1001", vec![entry("A2", "4")]))
        .await
        .expect("submit");
    assert_eq!(receipt.lines, 2);

    let stored = app
        .state
        .ledger
        .query(DateRange::default())
        .await
        .expect("query");
    let mut codes: Vec<&str> = stored[0].lines.iter().map(|l| l.item_code.as_str()).collect();
    codes.sort_unstable();
    assert_eq!(codes, vec!["A1", "A2"]);
}
