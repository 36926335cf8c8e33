// Shared fixture; not every test binary uses every helper.
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use orderdesk_api::{
    config::{AppConfig, DataConfig, ExportConfig},
    events::{Event, EventSender},
    ledger::{CsvLedger, InMemoryLedger, OrderLedger},
    AppState,
};

pub const ADMIN_TOKEN: &str = "integration_test_admin_token";

pub const ITEMS_CSV: &str = "ItemCode,ItemDescription,Domain,Category,SubCategory\n\
    A1,Anvil,Hardware,Tools,Hand\n\
    A2,Drill,Hardware,Tools,Power\n\
    A3,Hinge,Hardware,Fittings,Door\n\
    B1,Chips,Food,Snacks,Salty\n\
    B2,Cookie,Food,Snacks,Sweet\n";

pub const CUSTOMERS_CSV: &str = "CustomerNumber,CustomerName,SalesManager\n\
    1001,Acme,Avi\n\
    2002,Beta Corp,Dana\n\
    3003,Gamma Ltd,Dana\n";

/// Customer 1001 is entitled to the hardware tools only; 2002 and 3003 have
/// no entitlement files at all.
pub const ENTITLEMENT_1001_CSV: &str = "MaterialNumber\nA1\nA2\n";

pub struct TestApp {
    pub state: AppState,
    pub dir: tempfile::TempDir,
    // Keeps the event channel open so send_or_log stays quiet.
    _event_rx: mpsc::Receiver<Event>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_ledger(|_| Arc::new(InMemoryLedger::new()))
    }

    pub fn with_csv_ledger() -> Self {
        Self::with_ledger(|dir| {
            Arc::new(CsvLedger::open(dir.join("orders.csv")).expect("open ledger"))
        })
    }

    pub fn with_ledger(make_ledger: impl FnOnce(&Path) -> Arc<dyn OrderLedger>) -> Self {
        let dir = tempfile::TempDir::new().expect("tempdir");
        write_fixture_files(dir.path());

        let config = test_config(dir.path());
        let ledger = make_ledger(dir.path());
        let (event_tx, event_rx) = mpsc::channel(64);
        let state = AppState::build(config, ledger, EventSender::new(event_tx))
            .expect("app state builds from fixture data");

        Self {
            state,
            dir,
            _event_rx: event_rx,
        }
    }

    pub fn orders_file(&self) -> std::path::PathBuf {
        self.dir.path().join("orders.csv")
    }
}

pub fn write_fixture_files(dir: &Path) {
    fs::write(dir.join("items.csv"), ITEMS_CSV).expect("write items");
    fs::write(dir.join("customers.csv"), CUSTOMERS_CSV).expect("write customers");
    let entitlements = dir.join("customer_items");
    fs::create_dir_all(&entitlements).expect("mkdir");
    fs::write(entitlements.join("1001.csv"), ENTITLEMENT_1001_CSV).expect("write entitlement");
}

pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        admin_token: ADMIN_TOKEN.to_string(),
        data: DataConfig {
            items_file: dir.join("items.csv").to_string_lossy().into_owned(),
            customers_file: dir.join("customers.csv").to_string_lossy().into_owned(),
            entitlements_dir: dir.join("customer_items").to_string_lossy().into_owned(),
            orders_file: dir.join("orders.csv").to_string_lossy().into_owned(),
        },
        export: ExportConfig::default(),
    }
}
