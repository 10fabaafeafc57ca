use thiserror::Error;

use crate::{OrderId, OrderStatus, RiderId};

/// Reasons a `Dispatcher` refuses to change the board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("order {0} does not exist")]
    UnknownOrder(OrderId),
    #[error("rider {0} does not exist")]
    UnknownRider(RiderId),
    #[error("order {0} appears more than once")]
    DuplicateOrder(OrderId),
    #[error("rider {0} appears more than once")]
    DuplicateRider(RiderId),
    #[error("order {order} is already assigned to rider {rider}")]
    AlreadyAssigned { order: OrderId, rider: RiderId },
    #[error("rider {rider} is at capacity ({capacity} orders)")]
    CapacityExceeded { rider: RiderId, capacity: u32 },
    #[error("order {order} cannot be {status} with its current rider binding")]
    MisboundOrder { order: OrderId, status: OrderStatus },
    #[error("order {0} has been delivered")]
    OrderClosed(OrderId),
    #[error("order {order} cannot move from {from} to {to}")]
    InvalidTransition {
        order: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl DispatchError {
    /// Whether the error refers to an id that is not on the board
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownOrder(_) | Self::UnknownRider(_))
    }
}
