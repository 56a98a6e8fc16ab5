//! Order lookup collaborator trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::GatewayError;

/// One step of a shipment's tracking history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsEvent {
    pub time: String,
    pub status: String,
    pub location: String,
}

/// Shipment details for a dispatched order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub carrier: String,
    pub tracking_no: String,
    pub status: String,
    pub current_location: String,
    pub expected_delivery: String,
    pub events: Vec<LogisticsEvent>,
}

/// A customer order as seen by the order handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_no: String,
    pub item: String,
    pub amount_cents: u64,
    pub status: String,
    pub placed_at: String,
    pub shipment: Option<Shipment>,
}

impl OrderRecord {
    /// Plain-text summary injected into the order handler's model context.
    pub fn summary(&self) -> String {
        let mut info = format!(
            "Order number: {}\nItem: {}\nAmount: ${}.{:02}\nStatus: {}\nPlaced at: {}\n",
            self.order_no,
            self.item,
            self.amount_cents / 100,
            self.amount_cents % 100,
            self.status,
            self.placed_at,
        );

        match &self.shipment {
            Some(shipment) => {
                info.push_str(&format!(
                    "Carrier: {}\nTracking number: {}\nShipment status: {}\nCurrent location: {}\nExpected delivery: {}\nTracking history:\n",
                    shipment.carrier,
                    shipment.tracking_no,
                    shipment.status,
                    shipment.current_location,
                    shipment.expected_delivery,
                ));
                for event in &shipment.events {
                    info.push_str(&format!(
                        "  - {} | {} | {}\n",
                        event.time, event.status, event.location
                    ));
                }
            }
            None => {
                info.push_str("Shipment: not yet dispatched\n");
            }
        }

        info
    }
}

/// Trait for order storage backends
#[async_trait]
pub trait OrderStore: Send + Sync + Debug {
    /// Look up an order by its order number
    async fn find(&self, order_no: &str) -> Result<Option<OrderRecord>, GatewayError>;

    /// Known order numbers, sorted. Used for guidance when the user has not
    /// supplied one.
    async fn order_numbers(&self) -> Result<Vec<String>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipped_order() -> OrderRecord {
        OrderRecord {
            order_no: "ORD20240001".to_string(),
            item: "Wireless headphones".to_string(),
            amount_cents: 18999,
            status: "shipped".to_string(),
            placed_at: "2024-01-20 14:30:00".to_string(),
            shipment: Some(Shipment {
                carrier: "FastPost".to_string(),
                tracking_no: "FP1234567890".to_string(),
                status: "in transit".to_string(),
                current_location: "Regional hub".to_string(),
                expected_delivery: "2024-01-23".to_string(),
                events: vec![LogisticsEvent {
                    time: "2024-01-20 16:00".to_string(),
                    status: "picked up".to_string(),
                    location: "Warehouse".to_string(),
                }],
            }),
        }
    }

    #[test]
    fn test_summary_with_shipment() {
        let summary = shipped_order().summary();
        assert!(summary.contains("Order number: ORD20240001"));
        assert!(summary.contains("Amount: $189.99"));
        assert!(summary.contains("Tracking number: FP1234567890"));
        assert!(summary.contains("picked up"));
    }

    #[test]
    fn test_summary_without_shipment() {
        let mut order = shipped_order();
        order.shipment = None;
        let summary = order.summary();
        assert!(summary.contains("not yet dispatched"));
    }
}
