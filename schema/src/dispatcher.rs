use crate::{DispatchError, Order, OrderId, OrderStatus, Rider, RiderId};

/// Bookkeeping for which rider carries which order
pub trait Dispatcher {
    /// Riders known to this dispatcher
    type Riders<'a>: Iterator<Item = &'a Rider>
    where
        Self: 'a;
    /// Orders known to this dispatcher, in every status
    type Orders<'a>: Iterator<Item = &'a Order>
    where
        Self: 'a;

    fn riders<'a>(&'a self) -> Self::Riders<'a>;

    fn orders<'a>(&'a self) -> Self::Orders<'a>;

    fn rider(&self, id: &RiderId) -> Option<&Rider> {
        self.riders().find(|rider| &rider.id == id)
    }

    fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders().find(|order| &order.id == id)
    }

    /// Bind a pending order to a rider with spare capacity
    fn assign(&mut self, order: &OrderId, rider: &RiderId) -> Result<Transition, DispatchError>;

    /// Move an order to a different rider, releasing the load from its current rider.
    /// Orders without a rider are simply assigned.
    fn reassign(&mut self, order: &OrderId, rider: &RiderId)
        -> Result<Transition, DispatchError>;

    /// Advance (or release) an order along its lifecycle
    fn update_status(
        &mut self,
        order: &OrderId,
        status: OrderStatus,
    ) -> Result<Transition, DispatchError>;
}

/// The outcome of a successful `Dispatcher` operation, carrying the state after the change
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Assigned {
        order: Order,
        rider: Rider,
    },
    Reassigned {
        order: Order,
        from: Rider,
        to: Rider,
    },
    StatusChanged {
        order: Order,
        from: OrderStatus,
    },
    /// An assigned order went back to pending, freeing `rider`
    Released {
        order: Order,
        rider: Rider,
    },
    Unchanged(Order),
}

impl Transition {
    pub fn order(&self) -> &Order {
        match self {
            Self::Assigned { order, .. }
            | Self::Reassigned { order, .. }
            | Self::StatusChanged { order, .. }
            | Self::Released { order, .. }
            | Self::Unchanged(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Assigned { order, .. }
            | Self::Reassigned { order, .. }
            | Self::StatusChanged { order, .. }
            | Self::Released { order, .. }
            | Self::Unchanged(order) => order,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }

    /// Lines to show operators for this transition, oldest first
    pub fn messages(&self) -> Vec<String> {
        let status_line = |order: &Order| {
            format!("Order {} status updated to {}", order.id, order.status)
        };

        match self {
            Self::Assigned { order, rider } | Self::Reassigned { order, to: rider, .. } => vec![
                format!("Rider {} assigned to Order {}", rider.name, order.id),
                status_line(order),
            ],
            Self::StatusChanged { order, .. } | Self::Released { order, .. } => {
                vec![status_line(order)]
            }
            Self::Unchanged(_) => vec![],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new("7"),
            status,
            ..Default::default()
        }
    }

    fn rider(name: &str) -> Rider {
        Rider {
            id: RiderId::new(name),
            name: name.to_string(),
            capacity: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_assignment_messages() {
        let transition = Transition::Reassigned {
            order: order(OrderStatus::Assigned),
            from: rider("Kwame Adu"),
            to: rider("Ama Serwaa"),
        };

        assert_eq!(
            transition.messages(),
            vec![
                "Rider Ama Serwaa assigned to Order 7".to_string(),
                "Order 7 status updated to assigned".to_string(),
            ]
        );
    }

    #[test]
    fn test_status_messages() {
        let transition = Transition::StatusChanged {
            order: order(OrderStatus::InProgress),
            from: OrderStatus::Assigned,
        };
        assert_eq!(
            transition.messages(),
            vec!["Order 7 status updated to in-progress".to_string()]
        );

        let unchanged = Transition::Unchanged(order(OrderStatus::Pending));
        assert!(unchanged.messages().is_empty());
        assert!(!unchanged.is_change());
    }
}
