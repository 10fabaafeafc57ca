use std::fmt;

use once_cell::sync::Lazy;
use rand::Rng;

/// Where the dashboard map is centred when there is nothing to show (Accra)
pub static DEFAULT_CENTER: Lazy<Location> = Lazy::new(|| Location {
    lat: 5.6037,
    lng: -0.1870,
});

#[derive(Default, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RiderId(String);

impl RiderId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point on the map in decimal degrees
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns the location nudged by up to half of `max_step` degrees along each axis
    pub fn jitter<R: Rng + ?Sized>(&self, rng: &mut R, max_step: f64) -> Self {
        Self {
            lat: self.lat + (rng.gen::<f64>() - 0.5) * max_step,
            lng: self.lng + (rng.gen::<f64>() - 0.5) * max_step,
        }
    }
}

/// A delivery agent
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Rider {
    /// Unique identifier for the rider
    pub id: RiderId,
    /// Name shown to operators
    pub name: String,
    /// Last known position
    pub location: Location,
    /// Max number of orders the rider may carry at once
    pub capacity: u32,
    /// Tally of orders the rider is currently carrying
    pub current_orders: u32,
    /// Rating out of 5
    pub performance: f64,
}

impl Rider {
    pub fn has_capacity(&self) -> bool {
        self.current_orders < self.capacity
    }

    /// Reads riders from a seed file with lines of
    /// `id, name, lat, lng, capacity, current_orders, performance`
    pub fn from_csv(path: &str) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        let contents = String::from_utf8(std::fs::read(path)?)?;

        Ok(Self::parse_records(&contents)?)
    }

    fn parse_records(contents: &str) -> Result<Vec<Self>, String> {
        let mut riders = vec![];

        for (line_no, values) in records(contents, 7)? {
            let parse_err = |field: &str| format!("line {}: invalid {}", line_no, field);
            riders.push(Self {
                id: RiderId::new(values[0]),
                name: values[1].to_string(),
                location: Location {
                    lat: values[2].parse().map_err(|_| parse_err("lat"))?,
                    lng: values[3].parse().map_err(|_| parse_err("lng"))?,
                },
                capacity: values[4].parse().map_err(|_| parse_err("capacity"))?,
                current_orders: values[5]
                    .parse()
                    .map_err(|_| parse_err("current_orders"))?,
                performance: values[6].parse().map_err(|_| parse_err("performance"))?,
            });
        }

        Ok(riders)
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderType {
    #[default]
    Direct,
    ShopAndDeliver,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ShopAndDeliver => "shop-and-deliver",
        }
    }
}

impl<'a> TryFrom<&'a str> for OrderType {
    type Error = String;

    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        match s {
            "direct" => Ok(Self::Direct),
            "shop-and-deliver" => Ok(Self::ShopAndDeliver),
            _ => Err(format!("invalid order type: {}", s)),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel through which an order was placed
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderSource {
    #[default]
    Website,
    Phone,
    Call,
}

impl OrderSource {
    pub const ALL: [OrderSource; 3] = [Self::Website, Self::Phone, Self::Call];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "Website",
            Self::Phone => "Phone",
            Self::Call => "Call",
        }
    }
}

impl<'a> TryFrom<&'a str> for OrderSource {
    type Error = String;

    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        match s {
            "Website" => Ok(Self::Website),
            "Phone" => Ok(Self::Phone),
            "Call" => Ok(Self::Call),
            _ => Err(format!("invalid order source: {}", s)),
        }
    }
}

impl fmt::Display for OrderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in-progress",
            Self::Delivered => "delivered",
        }
    }

    /// Position of the status along the delivery lifecycle
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Assigned => 1,
            Self::InProgress => 2,
            Self::Delivered => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl<'a> TryFrom<&'a str> for OrderStatus {
    type Error = String;

    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in-progress" => Ok(Self::InProgress),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {}", s)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for delivery to a particular `Location`
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Order {
    /// Unique identifier for the order
    pub id: OrderId,
    pub kind: OrderType,
    pub source: OrderSource,
    pub status: OrderStatus,
    /// Drop-off point
    pub location: Location,
    /// Rider bound to the order, absent while pending
    pub assigned_rider: Option<RiderId>,
}

impl Order {
    /// Reads orders from a seed file with lines of
    /// `id, type, source, status, lat, lng, assigned_rider` (`-` for no rider)
    pub fn from_csv(path: &str) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        let contents = String::from_utf8(std::fs::read(path)?)?;

        Ok(Self::parse_records(&contents)?)
    }

    fn parse_records(contents: &str) -> Result<Vec<Self>, String> {
        let mut orders = vec![];

        for (line_no, values) in records(contents, 7)? {
            let parse_err = |field: &str| format!("line {}: invalid {}", line_no, field);
            let on_line = |e: String| format!("line {}: {}", line_no, e);
            orders.push(Self {
                id: OrderId::new(values[0]),
                kind: OrderType::try_from(values[1]).map_err(on_line)?,
                source: OrderSource::try_from(values[2]).map_err(on_line)?,
                status: OrderStatus::try_from(values[3]).map_err(on_line)?,
                location: Location {
                    lat: values[4].parse().map_err(|_| parse_err("lat"))?,
                    lng: values[5].parse().map_err(|_| parse_err("lng"))?,
                },
                assigned_rider: match values[6] {
                    "-" | "" => None,
                    id => Some(RiderId::new(id)),
                },
            });
        }

        Ok(orders)
    }
}

/// Splits seed file contents into numbered records of exactly `width` fields,
/// the first of which is a non-empty id
fn records(contents: &str, width: usize) -> Result<Vec<(usize, Vec<&str>)>, String> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let values = line.trim().split(", ").map(str::trim).collect::<Vec<_>>();
            if values.len() != width {
                Err(format!(
                    "line {}: expected {} fields, found {}",
                    i + 1,
                    width,
                    values.len()
                ))
            } else if values[0].is_empty() {
                Err(format!("line {}: missing id", i + 1))
            } else {
                Ok((i + 1, values))
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const RIDERS_PATH: &'static str = "../test_data/riders.csv";
    const ORDERS_PATH: &'static str = "../test_data/orders.csv";

    #[test]
    fn test_load_riders() -> Result<(), Box<dyn std::error::Error>> {
        let riders = Rider::from_csv(RIDERS_PATH)?;

        assert_eq!(riders.len(), 4);
        assert_eq!(riders[0].id, RiderId::new("1"));
        assert_eq!(riders[0].name, "Kwame Adu");
        assert_eq!(riders[0].location, Location::new(5.6037, -0.1870));
        assert_eq!((riders[0].current_orders, riders[0].capacity), (2, 5));
        assert_eq!(riders[1].performance, 4.8);

        Ok(())
    }

    #[test]
    fn test_load_orders() -> Result<(), Box<dyn std::error::Error>> {
        let orders = Order::from_csv(ORDERS_PATH)?;

        assert_eq!(orders.len(), 5);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].assigned_rider, None);
        assert_eq!(orders[1].kind, OrderType::ShopAndDeliver);
        assert_eq!(orders[1].source, OrderSource::Phone);
        assert_eq!(orders[1].assigned_rider, Some(RiderId::new("1")));
        assert_eq!(orders[4].status, OrderStatus::InProgress);

        Ok(())
    }

    #[test]
    fn test_short_record_names_line() {
        let err = records("1, a, b\n\n2, c", 3).unwrap_err();
        assert_eq!(err, "line 3: expected 3 fields, found 2");
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let err = Rider::parse_records(
            "1, Kwame Adu, 5.6037, -0.1870, 5, 2, 4.5\n, Ama Serwaa, 5.6, -0.2, 3, 1, 4.8",
        )
        .unwrap_err();
        assert_eq!(err, "line 2: missing id");

        let err = Order::parse_records(", direct, Website, pending, 5.6, -0.2, -").unwrap_err();
        assert_eq!(err, "line 1: missing id");
    }

    #[test]
    fn test_bad_enum_field_names_line() {
        let err = Order::parse_records(
            "1, direct, Website, pending, 5.6, -0.2, -\n2, direct, Website, In Progress, 5.6, -0.2, -",
        )
        .unwrap_err();
        assert_eq!(err, "line 2: invalid order status: In Progress");

        let err = Order::parse_records("7, express, Phone, pending, 5.6, -0.2, -").unwrap_err();
        assert!(err.starts_with("line 1: "));
    }

    #[test]
    fn test_text_forms() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::try_from(status.as_str()), Ok(status));
        }
        assert_eq!(
            OrderType::try_from("shop-and-deliver"),
            Ok(OrderType::ShopAndDeliver)
        );
        assert!(OrderStatus::try_from("In Progress").is_err());
        assert!(OrderSource::try_from("website").is_err());
    }

    #[test]
    fn test_jitter_stays_within_step() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = *DEFAULT_CENTER;

        for _ in 0..100 {
            let moved = start.jitter(&mut rng, 0.001);
            assert!((moved.lat - start.lat).abs() <= 0.0005);
            assert!((moved.lng - start.lng).abs() <= 0.0005);
        }
    }

    #[test]
    fn test_capacity() {
        let mut rider = Rider {
            capacity: 2,
            current_orders: 1,
            ..Default::default()
        };
        assert!(rider.has_capacity());

        rider.current_orders = 2;
        assert!(!rider.has_capacity());
    }
}
