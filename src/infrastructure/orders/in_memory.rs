//! In-memory order store with representative seed data

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{GatewayError, LogisticsEvent, OrderRecord, OrderStore, Shipment};

/// Order records keyed by order number, fixed after construction
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: HashMap<String, OrderRecord>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: OrderRecord) -> Self {
        self.orders.insert(order.order_no.clone(), order);
        self
    }

    /// Store pre-loaded with three representative orders: one shipped and in
    /// transit, one paid but not yet dispatched, one delivered.
    pub fn seeded() -> Self {
        Self::new()
            .with_order(OrderRecord {
                order_no: "ORD20240001".to_string(),
                item: "iPhone 15 Pro Max 256GB Black Titanium".to_string(),
                amount_cents: 999_900,
                status: "shipped".to_string(),
                placed_at: "2024-01-20 14:30:00".to_string(),
                shipment: Some(Shipment {
                    carrier: "SF Express".to_string(),
                    tracking_no: "SF1234567890".to_string(),
                    status: "in transit".to_string(),
                    current_location: "Shenzhen transfer center".to_string(),
                    expected_delivery: "2024-01-23".to_string(),
                    events: vec![
                        LogisticsEvent {
                            time: "2024-01-20 16:00".to_string(),
                            status: "picked up".to_string(),
                            location: "Guangzhou".to_string(),
                        },
                        LogisticsEvent {
                            time: "2024-01-21 08:00".to_string(),
                            status: "in transit".to_string(),
                            location: "Guangzhou transfer center".to_string(),
                        },
                        LogisticsEvent {
                            time: "2024-01-21 18:00".to_string(),
                            status: "in transit".to_string(),
                            location: "Shenzhen transfer center".to_string(),
                        },
                    ],
                }),
            })
            .with_order(OrderRecord {
                order_no: "ORD20240002".to_string(),
                item: "AirPods Pro 2".to_string(),
                amount_cents: 189_900,
                status: "pending dispatch".to_string(),
                placed_at: "2024-01-22 10:15:00".to_string(),
                shipment: None,
            })
            .with_order(OrderRecord {
                order_no: "ORD20240003".to_string(),
                item: "MacBook Pro 14 M3 Pro".to_string(),
                amount_cents: 1_499_900,
                status: "completed".to_string(),
                placed_at: "2024-01-10 09:00:00".to_string(),
                shipment: Some(Shipment {
                    carrier: "SF Express".to_string(),
                    tracking_no: "SF0987654321".to_string(),
                    status: "delivered".to_string(),
                    current_location: "Chaoyang District, Beijing".to_string(),
                    expected_delivery: "2024-01-12".to_string(),
                    events: vec![
                        LogisticsEvent {
                            time: "2024-01-10 10:00".to_string(),
                            status: "picked up".to_string(),
                            location: "Shanghai".to_string(),
                        },
                        LogisticsEvent {
                            time: "2024-01-11 06:00".to_string(),
                            status: "in transit".to_string(),
                            location: "Nanjing transfer center".to_string(),
                        },
                        LogisticsEvent {
                            time: "2024-01-11 20:00".to_string(),
                            status: "out for delivery".to_string(),
                            location: "Chaoyang District, Beijing".to_string(),
                        },
                        LogisticsEvent {
                            time: "2024-01-12 10:30".to_string(),
                            status: "delivered".to_string(),
                            location: "Chaoyang District, Beijing".to_string(),
                        },
                    ],
                }),
            })
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find(&self, order_no: &str) -> Result<Option<OrderRecord>, GatewayError> {
        Ok(self.orders.get(order_no).cloned())
    }

    async fn order_numbers(&self) -> Result<Vec<String>, GatewayError> {
        let mut numbers: Vec<String> = self.orders.keys().cloned().collect();
        numbers.sort();
        Ok(numbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_seeded_order() {
        let store = InMemoryOrderStore::seeded();

        let order = store.find("ORD20240001").await.unwrap().unwrap();
        assert_eq!(order.status, "shipped");
        let shipment = order.shipment.unwrap();
        assert_eq!(shipment.events.len(), 3);
        assert_eq!(shipment.tracking_no, "SF1234567890");
    }

    #[tokio::test]
    async fn test_pending_order_has_no_shipment() {
        let store = InMemoryOrderStore::seeded();

        let order = store.find("ORD20240002").await.unwrap().unwrap();
        assert_eq!(order.status, "pending dispatch");
        assert!(order.shipment.is_none());
    }

    #[tokio::test]
    async fn test_unknown_order_is_none() {
        let store = InMemoryOrderStore::seeded();

        assert!(store.find("ORD99999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_numbers_sorted() {
        let store = InMemoryOrderStore::seeded();

        let numbers = store.order_numbers().await.unwrap();
        assert_eq!(numbers, vec!["ORD20240001", "ORD20240002", "ORD20240003"]);
    }

    #[tokio::test]
    async fn test_with_order_builder() {
        let store = InMemoryOrderStore::new().with_order(OrderRecord {
            order_no: "ORD20249999".to_string(),
            item: "USB-C cable".to_string(),
            amount_cents: 1_900,
            status: "completed".to_string(),
            placed_at: "2024-02-01 12:00:00".to_string(),
            shipment: None,
        });

        assert_eq!(store.order_count(), 1);
        assert!(store.find("ORD20249999").await.unwrap().is_some());
    }
}
