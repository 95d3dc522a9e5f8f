use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Sale events
    SaleCreated {
        sale_id: Uuid,
        sale_number: String,
    },
    SaleCancelled {
        sale_id: Uuid,
        sale_number: String,
    },
    PaymentStatusChanged {
        sale_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    ProductDeactivated(Uuid),
    StockAdjusted {
        product_id: Uuid,
        previous_stock: i32,
        new_stock: i32,
    },
    LowStock {
        product_id: Uuid,
        stock: i32,
        min_stock: i32,
    },

    // Client events
    ClientCreated(Uuid),
    ClientUpdated(Uuid),
    ClientDeleted(Uuid),
    ClientDeactivated(Uuid),
    LoyaltyPointsChanged {
        client_id: Uuid,
        points: i32,
    },

    // Supplier events
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),
    SupplierDeactivated(Uuid),

    // User events
    UserRegistered(Uuid),
    UserLoggedIn(Uuid),
    UserUpdated(Uuid),
    UserDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event and logs delivery failure instead of surfacing it.
    /// State changes have already committed by the time events fire, so a
    /// full channel must not fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropping event {:?}: {}", event, e);
        }
    }
}

/// Creates a bounded event channel.
pub fn create_event_channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Consumes events and logs them. Runs as a background task for the
/// lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::SaleCreated {
                sale_id,
                sale_number,
            } => {
                info!(%sale_id, %sale_number, "Sale created");
            }
            Event::SaleCancelled {
                sale_id,
                sale_number,
            } => {
                info!(%sale_id, %sale_number, "Sale cancelled");
            }
            Event::LowStock {
                product_id,
                stock,
                min_stock,
            } => {
                warn!(%product_id, stock, min_stock, "Product stock at or below minimum");
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (sender, mut rx) = create_event_channel(8);
        let id = Uuid::new_v4();
        sender
            .send(Event::ProductCreated(id))
            .await
            .expect("send failed");

        match rx.recv().await {
            Some(Event::ProductCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (sender, rx) = create_event_channel(1);
        drop(rx);
        sender.send_or_log(Event::UserLoggedIn(Uuid::new_v4())).await;
    }
}
