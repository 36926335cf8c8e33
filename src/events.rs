//! Application events, fanned out over a bounded mpsc channel and consumed by
//! a single logging loop. Delivery is best-effort: a full or closed channel
//! must never fail the request that produced the event.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CatalogReloaded {
        items: usize,
        customers: usize,
    },
    CartUpdated {
        customer_number: String,
        lines: usize,
    },
    OrderSubmitted {
        order_serial: u64,
        customer_number: String,
        lines: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating delivery failures.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("event delivery failed: {}", err);
        }
    }
}

/// Event processing loop; runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::CatalogReloaded { items, customers } => {
                info!(items, customers, "catalog reloaded");
            }
            Event::CartUpdated {
                customer_number,
                lines,
            } => {
                info!(customer = %customer_number, lines, "cart updated");
            }
            Event::OrderSubmitted {
                order_serial,
                customer_number,
                lines,
            } => {
                info!(
                    order_serial,
                    customer = %customer_number,
                    lines,
                    "order submitted"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}
