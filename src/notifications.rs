//! Best-effort order notifications.
//!
//! Order placement hands an [`OrderNotification`] to the
//! [`NotificationDispatcher`], which only enqueues it. A [`NotificationWorker`]
//! running on its own task drains the queue and delivers each notification to
//! every [`NotificationSink`]. Delivery failures are logged and dropped; they
//! never reach the customer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::models::{CustomerInfo, Order};
use crate::money::{self, BigDecimal};

/// Data the back office needs to act on a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotification {
    pub order_number: String,
    pub items: Vec<NotificationItem>,
    pub customer: CustomerInfo,
    #[serde(with = "money::amount")]
    pub total_amount: BigDecimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "money::amount")]
    pub price: BigDecimal,
}

impl From<&Order> for OrderNotification {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            items: order
                .items
                .iter()
                .map(|item| NotificationItem {
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price: item.price.clone(),
                })
                .collect(),
            customer: order.customer.clone(),
            total_amount: order.total_amount.clone(),
            notes: order.notes.clone(),
        }
    }
}

impl OrderNotification {
    /// Plain-text summary used by messaging sinks.
    pub fn render_text(&self) -> String {
        let items = self
            .items
            .iter()
            .map(|item| format!("• {} x{}", item.product_name, item.quantity))
            .collect::<Vec<_>>()
            .join("\n");
        let c = &self.customer;
        let mut text = format!(
            "*New Order Received!*\n\nOrder: {}\nCustomer: {}\nPhone: {}\nAmount: ₹{}\n\nItems:\n{}\n\nAddress: {}, {}, {} - {}",
            self.order_number, c.name, c.phone, self.total_amount, items, c.address, c.city, c.state, c.pincode
        );
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            text.push_str(&format!("\n\nNotes: {}", notes));
        }
        text
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A delivery channel for order notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotificationError>;
}

/// Writes every order to the service log.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotificationError> {
        info!(
            order_number = %notification.order_number,
            customer = %notification.customer.name,
            items = notification.items.len(),
            total = %notification.total_amount,
            "New order received"
        );
        Ok(())
    }
}

/// Settings for the WhatsApp Cloud API sink.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub access_token: String,
    pub phone_number: String,
}

/// Sends the order summary as a WhatsApp text message.
pub struct WhatsAppSink {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppSink {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NotificationSink for WhatsAppSink {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotificationError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": self.config.phone_number,
            "type": "text",
            "text": { "body": notification.render_text() },
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status, body });
        }
        Ok(())
    }
}

/// Producer side of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<OrderNotification>,
}

impl NotificationDispatcher {
    /// Create a dispatcher and the worker that drains it. The worker must be
    /// spawned for anything to be delivered.
    pub fn new(
        capacity: usize,
        sinks: Vec<Arc<dyn NotificationSink>>,
        timeout: Duration,
    ) -> (Self, NotificationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = NotificationWorker {
            receiver,
            sinks,
            timeout,
        };
        (Self { sender }, worker)
    }

    /// Queue a notification without waiting. Never fails the caller.
    pub fn dispatch(&self, notification: OrderNotification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!("Notification queue full, dropping notification for {}", dropped.order_number);
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!("Notification worker stopped, dropping notification for {}", dropped.order_number);
            }
        }
    }
}

/// Consumer side of the notification queue.
pub struct NotificationWorker {
    receiver: mpsc::Receiver<OrderNotification>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    timeout: Duration,
}

impl NotificationWorker {
    /// Deliver notifications until every dispatcher has been dropped.
    pub async fn run(mut self) {
        debug!("Notification worker started with {} sinks", self.sinks.len());
        while let Some(notification) = self.receiver.recv().await {
            for sink in &self.sinks {
                let outcome = tokio::time::timeout(self.timeout, sink.deliver(&notification))
                    .await
                    .unwrap_or(Err(NotificationError::Timeout(self.timeout)));
                match outcome {
                    Ok(()) => debug!("Delivered {} via {}", notification.order_number, sink.name()),
                    Err(e) => warn!(
                        "Failed to deliver {} via {}: {}",
                        notification.order_number,
                        sink.name(),
                        e
                    ),
                }
            }
        }
        debug!("Notification worker stopped");
    }
}
