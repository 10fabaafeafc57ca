use std::time::SystemTime;

mod dispatcher;
mod entities;
mod error;
mod notifications;
mod runner;
mod snapshot;

pub mod proto {
    pub mod dispatch;
}

pub use dispatcher::{Dispatcher, Transition};
pub use entities::{
    Location, Order, OrderId, OrderSource, OrderStatus, OrderType, Rider, RiderId,
    DEFAULT_CENTER,
};
pub use error::DispatchError;
pub use notifications::{Notification, NotificationFeed};
pub use runner::{Runner, Speed};
pub use snapshot::Snapshot;

pub const SAMPLE_RIDERS_CSV_PATH: &'static str = "./test_data/riders.csv";
pub const SAMPLE_ORDERS_CSV_PATH: &'static str = "./test_data/orders.csv";

/// Conversion between model types and their protobuf messages.
/// Decoding yields `None` for messages missing required parts.
pub trait ToFromProto<Proto>: Sized
where
    Proto: prost::Message,
{
    fn try_from_proto(proto: Proto) -> Option<Self>;
    fn into_proto(self) -> Proto;
}

impl ToFromProto<proto::dispatch::Location> for Location {
    fn into_proto(self) -> proto::dispatch::Location {
        proto::dispatch::Location {
            lat: self.lat,
            lng: self.lng,
        }
    }

    fn try_from_proto(message: proto::dispatch::Location) -> Option<Self> {
        (message.lat.is_finite() && message.lng.is_finite())
            .then(|| Location::new(message.lat, message.lng))
    }
}

impl ToFromProto<proto::dispatch::Rider> for Rider {
    fn into_proto(self) -> proto::dispatch::Rider {
        proto::dispatch::Rider {
            id: self.id.to_string(),
            name: self.name,
            location: Some(self.location.into_proto()),
            capacity: self.capacity,
            current_orders: self.current_orders,
            performance: self.performance,
        }
    }

    fn try_from_proto(message: proto::dispatch::Rider) -> Option<Self> {
        if message.id.is_empty() {
            return None;
        }

        Some(Self {
            id: RiderId::new(&message.id),
            name: message.name,
            location: message.location.and_then(Location::try_from_proto)?,
            capacity: message.capacity,
            current_orders: message.current_orders,
            performance: message.performance,
        })
    }
}

impl ToFromProto<proto::dispatch::Order> for Order {
    fn into_proto(self) -> proto::dispatch::Order {
        proto::dispatch::Order {
            id: self.id.to_string(),
            kind: proto::dispatch::OrderKind::from(self.kind).into(),
            source: proto::dispatch::OrderSource::from(self.source).into(),
            status: proto::dispatch::OrderStatus::from(self.status).into(),
            location: Some(self.location.into_proto()),
            assigned_rider: self.assigned_rider.map(|id| id.to_string()),
        }
    }

    fn try_from_proto(message: proto::dispatch::Order) -> Option<Self> {
        if message.id.is_empty() {
            return None;
        }

        Some(Self {
            id: OrderId::new(&message.id),
            kind: proto::dispatch::OrderKind::try_from(message.kind)
                .ok()?
                .into(),
            source: proto::dispatch::OrderSource::try_from(message.source)
                .ok()?
                .into(),
            status: proto::dispatch::OrderStatus::try_from(message.status)
                .ok()?
                .into(),
            location: message.location.and_then(Location::try_from_proto)?,
            assigned_rider: message
                .assigned_rider
                .filter(|id| !id.is_empty())
                .map(|id| RiderId::new(&id)),
        })
    }
}

impl ToFromProto<proto::dispatch::Notification> for Notification {
    fn into_proto(self) -> proto::dispatch::Notification {
        proto::dispatch::Notification {
            at: Some(self.at.into()),
            message: self.message,
        }
    }

    fn try_from_proto(message: proto::dispatch::Notification) -> Option<Self> {
        Some(Self {
            at: message.at.and_then(|at| SystemTime::try_from(at).ok())?,
            message: message.message,
        })
    }
}

impl ToFromProto<proto::dispatch::Snapshot> for Snapshot {
    fn into_proto(self) -> proto::dispatch::Snapshot {
        proto::dispatch::Snapshot {
            sequence: self.sequence,
            riders: self.riders.into_iter().map(Rider::into_proto).collect(),
            orders: self.orders.into_iter().map(Order::into_proto).collect(),
            notifications: self
                .notifications
                .into_iter()
                .map(Notification::into_proto)
                .collect(),
        }
    }

    fn try_from_proto(message: proto::dispatch::Snapshot) -> Option<Self> {
        Some(Self {
            sequence: message.sequence,
            riders: message
                .riders
                .into_iter()
                .filter_map(Rider::try_from_proto)
                .collect(),
            orders: message
                .orders
                .into_iter()
                .filter_map(Order::try_from_proto)
                .collect(),
            notifications: message
                .notifications
                .into_iter()
                .filter_map(Notification::try_from_proto)
                .collect(),
        })
    }
}

impl From<OrderType> for proto::dispatch::OrderKind {
    fn from(kind: OrderType) -> Self {
        match kind {
            OrderType::Direct => Self::Direct,
            OrderType::ShopAndDeliver => Self::ShopAndDeliver,
        }
    }
}

impl From<proto::dispatch::OrderKind> for OrderType {
    fn from(kind: proto::dispatch::OrderKind) -> Self {
        match kind {
            proto::dispatch::OrderKind::Direct => Self::Direct,
            proto::dispatch::OrderKind::ShopAndDeliver => Self::ShopAndDeliver,
        }
    }
}

impl From<OrderSource> for proto::dispatch::OrderSource {
    fn from(source: OrderSource) -> Self {
        match source {
            OrderSource::Website => Self::Website,
            OrderSource::Phone => Self::Phone,
            OrderSource::Call => Self::Call,
        }
    }
}

impl From<proto::dispatch::OrderSource> for OrderSource {
    fn from(source: proto::dispatch::OrderSource) -> Self {
        match source {
            proto::dispatch::OrderSource::Website => Self::Website,
            proto::dispatch::OrderSource::Phone => Self::Phone,
            proto::dispatch::OrderSource::Call => Self::Call,
        }
    }
}

impl From<OrderStatus> for proto::dispatch::OrderStatus {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => Self::Pending,
            OrderStatus::Assigned => Self::Assigned,
            OrderStatus::InProgress => Self::InProgress,
            OrderStatus::Delivered => Self::Delivered,
        }
    }
}

impl From<proto::dispatch::OrderStatus> for OrderStatus {
    fn from(status: proto::dispatch::OrderStatus) -> Self {
        match status {
            proto::dispatch::OrderStatus::Pending => Self::Pending,
            proto::dispatch::OrderStatus::Assigned => Self::Assigned,
            proto::dispatch::OrderStatus::InProgress => Self::InProgress,
            proto::dispatch::OrderStatus::Delivered => Self::Delivered,
        }
    }
}
