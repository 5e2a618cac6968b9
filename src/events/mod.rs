use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Default capacity of the in-process event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event without ever failing the caller; a closed channel is only logged.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Creates a bounded channel and the sender wrapper services hold.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Domain events emitted after a workflow step has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Catalog
    ItemCreated(Uuid),
    ItemDeleted(Uuid),
    StockMoved {
        item_id: Uuid,
        delta: i32,
        balance_after: i32,
        reference: Option<String>,
    },
    LowStock {
        item_id: Uuid,
        quantity: i32,
        min_quantity: i32,
    },

    // Purchasing
    RequisitionCreated(Uuid),
    RequisitionStatusChanged {
        pr_id: Uuid,
        from: String,
        to: String,
    },
    RfqCreated {
        rfq_id: Uuid,
        pr_id: Uuid,
    },
    RfqStatusChanged {
        rfq_id: Uuid,
        from: String,
        to: String,
    },
    QuotationRecorded {
        quotation_id: Uuid,
        rfq_id: Uuid,
    },
    PurchaseOrderCreated {
        po_id: Uuid,
        quotation_id: Uuid,
    },
    PurchaseOrderStatusChanged {
        po_id: Uuid,
        from: String,
        to: String,
    },
    GoodsReceiptPosted {
        gr_id: Uuid,
        po_id: Uuid,
        po_completed: bool,
    },
}

/// Drains the event channel, logging each event until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStock {
                item_id,
                quantity,
                min_quantity,
            } => {
                warn!(%item_id, quantity, min_quantity, "Item is below its minimum stock level");
            }
            Event::GoodsReceiptPosted {
                gr_id,
                po_id,
                po_completed,
            } => {
                info!(%gr_id, %po_id, po_completed, "Goods receipt posted");
            }
            other => info!(event = ?other, "Domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        sender.send_or_log(Event::ItemCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (sender, mut rx) = channel(4);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        sender.send_or_log(Event::RequisitionCreated(first)).await;
        sender.send_or_log(Event::RequisitionCreated(second)).await;

        assert_eq!(rx.recv().await, Some(Event::RequisitionCreated(first)));
        assert_eq!(rx.recv().await, Some(Event::RequisitionCreated(second)));
    }
}
