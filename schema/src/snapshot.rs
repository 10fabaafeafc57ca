use std::collections::HashMap;

use itertools::Itertools;

use crate::{Notification, Order, OrderSource, OrderStatus, Rider, RiderId};

/// Everything a dashboard needs to render the board at a point in time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Increases by one with every snapshot emitted by a runner
    pub sequence: u64,
    pub riders: Vec<Rider>,
    pub orders: Vec<Order>,
    /// Newest first
    pub notifications: Vec<Notification>,
}

impl Snapshot {
    pub fn rider(&self, id: &RiderId) -> Option<&Rider> {
        self.riders.iter().find(|rider| &rider.id == id)
    }

    /// Name of the rider bound to `order`, if any
    pub fn rider_name(&self, order: &Order) -> Option<&str> {
        order
            .assigned_rider
            .as_ref()
            .and_then(|id| self.rider(id))
            .map(|rider| rider.name.as_str())
    }

    /// Riders able to take on another order
    pub fn available_riders(&self) -> impl Iterator<Item = &Rider> {
        self.riders.iter().filter(|rider| rider.has_capacity())
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
    }

    pub fn orders_from(&self, source: OrderSource) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(move |order| order.source == source)
    }

    /// Number of orders in each status
    pub fn order_counts(&self) -> HashMap<OrderStatus, usize> {
        self.orders.iter().map(|order| order.status).counts()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::OrderId;

    fn snapshot() -> Snapshot {
        Snapshot {
            sequence: 3,
            riders: vec![
                Rider {
                    id: RiderId::new("1"),
                    name: "Kwame Adu".to_string(),
                    capacity: 2,
                    current_orders: 2,
                    ..Default::default()
                },
                Rider {
                    id: RiderId::new("2"),
                    name: "Ama Serwaa".to_string(),
                    capacity: 3,
                    current_orders: 1,
                    ..Default::default()
                },
            ],
            orders: vec![
                Order {
                    id: OrderId::new("1"),
                    source: OrderSource::Website,
                    ..Default::default()
                },
                Order {
                    id: OrderId::new("2"),
                    source: OrderSource::Phone,
                    status: OrderStatus::Assigned,
                    assigned_rider: Some(RiderId::new("2")),
                    ..Default::default()
                },
                Order {
                    id: OrderId::new("3"),
                    source: OrderSource::Website,
                    status: OrderStatus::Assigned,
                    assigned_rider: Some(RiderId::new("9")),
                    ..Default::default()
                },
            ],
            notifications: vec![],
        }
    }

    #[test]
    fn test_views() {
        let snapshot = snapshot();

        let available = snapshot.available_riders().map(|r| r.name.as_str()).collect_vec();
        assert_eq!(available, vec!["Ama Serwaa"]);

        let pending = snapshot.pending_orders().map(|o| o.id.as_str()).collect_vec();
        assert_eq!(pending, vec!["1"]);

        let website = snapshot
            .orders_from(OrderSource::Website)
            .map(|o| o.id.as_str())
            .collect_vec();
        assert_eq!(website, vec!["1", "3"]);
        assert_eq!(snapshot.orders_from(OrderSource::Call).count(), 0);
    }

    #[test]
    fn test_rider_name_for_dangling_reference() {
        let snapshot = snapshot();

        assert_eq!(snapshot.rider_name(&snapshot.orders[1]), Some("Ama Serwaa"));
        assert_eq!(snapshot.rider_name(&snapshot.orders[2]), None);
        assert_eq!(snapshot.rider_name(&snapshot.orders[0]), None);
    }

    #[test]
    fn test_order_counts() {
        let counts = snapshot().order_counts();

        assert_eq!(counts.get(&OrderStatus::Assigned), Some(&2));
        assert_eq!(counts.get(&OrderStatus::Pending), Some(&1));
        assert_eq!(counts.get(&OrderStatus::Delivered), None);
    }
}
