use std::collections::HashSet;
use std::slice;

use itertools::Itertools;
use rand::Rng;
use schema::{
    DispatchError, Dispatcher, Order, OrderId, OrderStatus, Rider, RiderId, Transition,
};

/// In-memory board of riders and orders, kept in the order they were seeded
#[derive(Clone, Debug, Default)]
pub struct Board {
    riders: Vec<Rider>,
    orders: Vec<Order>,
}

impl Board {
    /// Build a board from seed data, rejecting duplicate ids,
    /// orders bound to riders that don't exist, pending orders with a rider
    /// and assigned or in-progress orders without one.
    /// Rider tallies are taken as given.
    pub fn new(riders: Vec<Rider>, orders: Vec<Order>) -> Result<Self, DispatchError> {
        if let Some(id) = riders.iter().map(|rider| &rider.id).duplicates().next() {
            return Err(DispatchError::DuplicateRider(id.clone()));
        }
        if let Some(id) = orders.iter().map(|order| &order.id).duplicates().next() {
            return Err(DispatchError::DuplicateOrder(id.clone()));
        }

        let rider_ids = riders.iter().map(|rider| &rider.id).collect::<HashSet<_>>();
        if let Some(id) = orders
            .iter()
            .filter_map(|order| order.assigned_rider.as_ref())
            .find(|id| !rider_ids.contains(id))
        {
            return Err(DispatchError::UnknownRider(id.clone()));
        }

        let misbound = orders.iter().find(|order| match order.status {
            OrderStatus::Pending => order.assigned_rider.is_some(),
            OrderStatus::Assigned | OrderStatus::InProgress => order.assigned_rider.is_none(),
            OrderStatus::Delivered => false,
        });
        if let Some(order) = misbound {
            return Err(DispatchError::MisboundOrder {
                order: order.id.clone(),
                status: order.status,
            });
        }

        Ok(Self { riders, orders })
    }

    /// Move every rider by a random amount of up to half of `max_step` degrees per axis
    pub fn drift_riders<R: Rng + ?Sized>(&mut self, rng: &mut R, max_step: f64) {
        for rider in self.riders.iter_mut() {
            rider.location = rider.location.jitter(rng, max_step);
        }
    }

    fn order_index(&self, id: &OrderId) -> Result<usize, DispatchError> {
        self.orders
            .iter()
            .position(|order| &order.id == id)
            .ok_or_else(|| DispatchError::UnknownOrder(id.clone()))
    }

    fn rider_index(&self, id: &RiderId) -> Result<usize, DispatchError> {
        self.riders
            .iter()
            .position(|rider| &rider.id == id)
            .ok_or_else(|| DispatchError::UnknownRider(id.clone()))
    }

    fn ensure_capacity(&self, rider: usize) -> Result<(), DispatchError> {
        let rider = &self.riders[rider];
        if rider.has_capacity() {
            Ok(())
        } else {
            Err(DispatchError::CapacityExceeded {
                rider: rider.id.clone(),
                capacity: rider.capacity,
            })
        }
    }

    /// Drop one order from the tally of the rider bound to `order`, if it still exists
    fn release_load(&mut self, order: usize) {
        let rider = self.orders[order]
            .assigned_rider
            .as_ref()
            .and_then(|id| self.rider_index(id).ok());
        if let Some(rider) = rider {
            let rider = &mut self.riders[rider];
            rider.current_orders = rider.current_orders.saturating_sub(1);
        }
    }

    fn bind(&mut self, order: usize, rider: usize) {
        self.riders[rider].current_orders += 1;
        let order = &mut self.orders[order];
        order.assigned_rider = Some(self.riders[rider].id.clone());
        order.status = OrderStatus::Assigned;
    }
}

impl Dispatcher for Board {
    type Riders<'a> = slice::Iter<'a, Rider>;
    type Orders<'a> = slice::Iter<'a, Order>;

    fn riders(&self) -> Self::Riders<'_> {
        self.riders.iter()
    }

    fn orders(&self) -> Self::Orders<'_> {
        self.orders.iter()
    }

    fn assign(&mut self, order: &OrderId, rider: &RiderId) -> Result<Transition, DispatchError> {
        let order_idx = self.order_index(order)?;
        let rider_idx = self.rider_index(rider)?;

        let current = &self.orders[order_idx];
        if current.status.is_terminal() {
            return Err(DispatchError::OrderClosed(order.clone()));
        }
        if let Some(assigned) = current.assigned_rider.as_ref() {
            return Err(DispatchError::AlreadyAssigned {
                order: order.clone(),
                rider: assigned.clone(),
            });
        }
        self.ensure_capacity(rider_idx)?;

        self.bind(order_idx, rider_idx);
        log::info!("assigned order {} to rider {}", order, rider);

        Ok(Transition::Assigned {
            order: self.orders[order_idx].clone(),
            rider: self.riders[rider_idx].clone(),
        })
    }

    fn reassign(&mut self, order: &OrderId, rider: &RiderId) -> Result<Transition, DispatchError> {
        let order_idx = self.order_index(order)?;
        let rider_idx = self.rider_index(rider)?;

        let current = &self.orders[order_idx];
        if current.status.is_terminal() {
            return Err(DispatchError::OrderClosed(order.clone()));
        }
        let Some(previous) = current.assigned_rider.clone() else {
            return self.assign(order, rider);
        };
        if &previous == rider {
            return Ok(Transition::Unchanged(current.clone()));
        }
        self.ensure_capacity(rider_idx)?;

        self.release_load(order_idx);
        self.bind(order_idx, rider_idx);
        log::info!(
            "reassigned order {} from rider {} to rider {}",
            order,
            previous,
            rider
        );

        // The previous rider may have been a dangling seed reference
        let from = self
            .rider_index(&previous)
            .map(|idx| self.riders[idx].clone())
            .unwrap_or_else(|_| Rider {
                id: previous,
                ..Default::default()
            });

        Ok(Transition::Reassigned {
            order: self.orders[order_idx].clone(),
            from,
            to: self.riders[rider_idx].clone(),
        })
    }

    fn update_status(
        &mut self,
        order: &OrderId,
        status: OrderStatus,
    ) -> Result<Transition, DispatchError> {
        use OrderStatus::*;

        let order_idx = self.order_index(order)?;
        let from = self.orders[order_idx].status;

        if from == status {
            return Ok(Transition::Unchanged(self.orders[order_idx].clone()));
        }

        match (from, status) {
            (Assigned, Pending) => {
                self.release_load(order_idx);
                let released = self.orders[order_idx]
                    .assigned_rider
                    .take()
                    .and_then(|id| self.rider_index(&id).ok())
                    .map(|idx| self.riders[idx].clone())
                    .unwrap_or_default();
                self.orders[order_idx].status = Pending;
                log::info!("released order {}", order);

                Ok(Transition::Released {
                    order: self.orders[order_idx].clone(),
                    rider: released,
                })
            }

            (Assigned | InProgress, to) if to.rank() > from.rank() => {
                if to == Delivered {
                    self.release_load(order_idx);
                }
                self.orders[order_idx].status = to;
                log::info!("order {} moved from {} to {}", order, from, to);

                Ok(Transition::StatusChanged {
                    order: self.orders[order_idx].clone(),
                    from,
                })
            }

            (from, to) => Err(DispatchError::InvalidTransition {
                order: order.clone(),
                from,
                to,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const RIDERS_PATH: &'static str = "../test_data/riders.csv";
    const ORDERS_PATH: &'static str = "../test_data/orders.csv";

    fn seeded() -> Result<Board, Box<dyn std::error::Error>> {
        Ok(Board::new(
            Rider::from_csv(RIDERS_PATH)?,
            Order::from_csv(ORDERS_PATH)?,
        )?)
    }

    fn load(board: &Board, id: &str) -> u32 {
        board
            .rider(&RiderId::new(id))
            .map(|rider| rider.current_orders)
            .expect("rider")
    }

    fn status(board: &Board, id: &str) -> OrderStatus {
        board.order(&OrderId::new(id)).expect("order").status
    }

    #[test]
    fn test_assign_pending_order() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;

        let transition = board.assign(&OrderId::new("1"), &RiderId::new("2"))?;

        assert!(matches!(transition, Transition::Assigned { .. }));
        assert_eq!(status(&board, "1"), OrderStatus::Assigned);
        assert_eq!(
            transition.order().assigned_rider,
            Some(RiderId::new("2"))
        );
        assert_eq!(load(&board, "2"), 2);

        Ok(())
    }

    #[test]
    fn test_assign_rejections_leave_board_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;

        assert_eq!(
            board.assign(&OrderId::new("2"), &RiderId::new("2")),
            Err(DispatchError::AlreadyAssigned {
                order: OrderId::new("2"),
                rider: RiderId::new("1"),
            })
        );
        assert_eq!(
            board.assign(&OrderId::new("3"), &RiderId::new("2")),
            Err(DispatchError::OrderClosed(OrderId::new("3")))
        );
        assert_eq!(
            board.assign(&OrderId::new("1"), &RiderId::new("4")),
            Err(DispatchError::CapacityExceeded {
                rider: RiderId::new("4"),
                capacity: 1,
            })
        );
        assert_eq!(
            board.assign(&OrderId::new("99"), &RiderId::new("1")),
            Err(DispatchError::UnknownOrder(OrderId::new("99")))
        );
        assert_eq!(
            board.assign(&OrderId::new("1"), &RiderId::new("99")),
            Err(DispatchError::UnknownRider(RiderId::new("99")))
        );

        assert_eq!(status(&board, "1"), OrderStatus::Pending);
        assert_eq!(load(&board, "2"), 1);
        assert_eq!(load(&board, "4"), 1);

        Ok(())
    }

    #[test]
    fn test_reassign_moves_load() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;

        let transition = board.reassign(&OrderId::new("2"), &RiderId::new("3"))?;

        let Transition::Reassigned { from, to, order } = transition else {
            panic!("expected reassignment");
        };
        assert_eq!(from.id, RiderId::new("1"));
        assert_eq!(to.id, RiderId::new("3"));
        assert_eq!(order.assigned_rider, Some(RiderId::new("3")));
        assert_eq!(load(&board, "1"), 1);
        assert_eq!(load(&board, "3"), 1);

        Ok(())
    }

    #[test]
    fn test_reassign_in_progress_order_restarts_assignment(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;

        board.reassign(&OrderId::new("5"), &RiderId::new("2"))?;

        assert_eq!(status(&board, "5"), OrderStatus::Assigned);
        assert_eq!(load(&board, "4"), 0);
        assert_eq!(load(&board, "2"), 2);

        Ok(())
    }

    #[test]
    fn test_reassign_edge_cases() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;

        // Same rider is a no-op
        let transition = board.reassign(&OrderId::new("2"), &RiderId::new("1"))?;
        assert!(!transition.is_change());
        assert_eq!(load(&board, "1"), 2);

        // Pending orders are simply assigned
        let transition = board.reassign(&OrderId::new("4"), &RiderId::new("3"))?;
        assert!(matches!(transition, Transition::Assigned { .. }));
        assert_eq!(load(&board, "3"), 1);

        // Full riders can't take more
        assert!(matches!(
            board.reassign(&OrderId::new("2"), &RiderId::new("4")),
            Err(DispatchError::CapacityExceeded { .. })
        ));
        assert_eq!(load(&board, "1"), 2);

        assert_eq!(
            board.reassign(&OrderId::new("3"), &RiderId::new("1")),
            Err(DispatchError::OrderClosed(OrderId::new("3")))
        );

        Ok(())
    }

    #[test]
    fn test_status_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;
        let order = OrderId::new("2");

        board.update_status(&order, OrderStatus::InProgress)?;
        assert_eq!(status(&board, "2"), OrderStatus::InProgress);
        assert_eq!(load(&board, "1"), 2);

        let transition = board.update_status(&order, OrderStatus::Delivered)?;
        assert_eq!(
            transition,
            Transition::StatusChanged {
                order: board.order(&order).cloned().expect("order"),
                from: OrderStatus::InProgress,
            }
        );
        assert_eq!(load(&board, "1"), 1);
        // The rider is kept for the record
        assert_eq!(
            board.order(&order).and_then(|o| o.assigned_rider.clone()),
            Some(RiderId::new("1"))
        );

        assert_eq!(
            board.update_status(&order, OrderStatus::InProgress),
            Err(DispatchError::InvalidTransition {
                order: order.clone(),
                from: OrderStatus::Delivered,
                to: OrderStatus::InProgress,
            })
        );

        Ok(())
    }

    #[test]
    fn test_status_rules_for_pending_orders() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;
        let order = OrderId::new("1");

        assert!(!board.update_status(&order, OrderStatus::Pending)?.is_change());
        for status in [
            OrderStatus::Assigned,
            OrderStatus::InProgress,
            OrderStatus::Delivered,
        ] {
            assert!(matches!(
                board.update_status(&order, status),
                Err(DispatchError::InvalidTransition { .. })
            ));
        }

        Ok(())
    }

    #[test]
    fn test_release_assigned_order() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;

        let transition = board.update_status(&OrderId::new("2"), OrderStatus::Pending)?;

        let Transition::Released { order, rider } = transition else {
            panic!("expected release");
        };
        assert_eq!(order.assigned_rider, None);
        assert_eq!(rider.id, RiderId::new("1"));
        assert_eq!(load(&board, "1"), 1);

        // Released orders can be picked up again
        board.assign(&OrderId::new("2"), &RiderId::new("3"))?;
        assert_eq!(load(&board, "3"), 1);

        // In-progress orders can't be released
        assert!(matches!(
            board.update_status(&OrderId::new("5"), OrderStatus::Pending),
            Err(DispatchError::InvalidTransition { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_rejects_bad_seed_data() {
        let rider = Rider {
            id: RiderId::new("1"),
            ..Default::default()
        };
        let order = Order {
            id: OrderId::new("1"),
            status: OrderStatus::Assigned,
            assigned_rider: Some(RiderId::new("2")),
            ..Default::default()
        };

        assert_eq!(
            Board::new(vec![rider.clone(), rider.clone()], vec![]).err(),
            Some(DispatchError::DuplicateRider(RiderId::new("1")))
        );
        assert_eq!(
            Board::new(vec![rider.clone()], vec![order.clone(), order.clone()]).err(),
            Some(DispatchError::DuplicateOrder(OrderId::new("1")))
        );
        assert_eq!(
            Board::new(vec![rider], vec![order]).err(),
            Some(DispatchError::UnknownRider(RiderId::new("2")))
        );
    }

    #[test]
    fn test_rejects_orders_bound_against_their_status() {
        let riders = vec![Rider {
            id: RiderId::new("1"),
            capacity: 2,
            ..Default::default()
        }];
        let pending_with_rider = Order {
            id: OrderId::new("1"),
            status: OrderStatus::Pending,
            assigned_rider: Some(RiderId::new("1")),
            ..Default::default()
        };
        let in_progress_without_rider = Order {
            id: OrderId::new("2"),
            status: OrderStatus::InProgress,
            ..Default::default()
        };
        let delivered_without_rider = Order {
            id: OrderId::new("3"),
            status: OrderStatus::Delivered,
            ..Default::default()
        };

        assert_eq!(
            Board::new(riders.clone(), vec![pending_with_rider]).err(),
            Some(DispatchError::MisboundOrder {
                order: OrderId::new("1"),
                status: OrderStatus::Pending,
            })
        );
        assert_eq!(
            Board::new(riders.clone(), vec![in_progress_without_rider]).err(),
            Some(DispatchError::MisboundOrder {
                order: OrderId::new("2"),
                status: OrderStatus::InProgress,
            })
        );
        assert!(Board::new(riders, vec![delivered_without_rider]).is_ok());
    }

    #[test]
    fn test_drift_only_moves_riders() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = seeded()?;
        let before = board.clone();
        let mut rng = StdRng::seed_from_u64(42);

        board.drift_riders(&mut rng, 0.001);

        for (moved, original) in board.riders().zip(before.riders()) {
            assert_ne!(moved.location, original.location);
            assert!((moved.location.lat - original.location.lat).abs() <= 0.0005);
            assert_eq!(moved.current_orders, original.current_orders);
        }
        assert!(board.orders().eq(before.orders()));

        Ok(())
    }
}
