use iced::widget::canvas;
use iced::widget::canvas::{Path, Text};
use iced::Color;
use iced::Size;
use iced::{Element, Length, Point, Renderer, Theme};
use itertools::{Itertools, MinMaxResult};
use schema::{Location, Snapshot, DEFAULT_CENTER};

use super::Message;

/// Degrees of padding shown around the outermost markers
const MARGIN_DEG: f64 = 0.005;
/// Pixels kept free at the canvas edges so that labels fit
const EDGE_PX: f32 = 40.0;

const RIDER_COLOR: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};
const ORDER_COLOR: Color = Color {
    r: 0.85,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Area of the map to draw, in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    min: Location,
    max: Location,
}

impl Bounds {
    /// Smallest box containing every location plus a margin,
    /// centred on `DEFAULT_CENTER` if there is nothing to show
    pub fn around(locations: &[Location]) -> Self {
        let range = |values: Vec<f64>, fallback: f64| {
            match values.into_iter().minmax_by(|a, b| a.total_cmp(b)) {
                MinMaxResult::NoElements => (fallback, fallback),
                MinMaxResult::OneElement(x) => (x, x),
                MinMaxResult::MinMax(min, max) => (min, max),
            }
        };

        let lats = locations.iter().map(|l| l.lat).collect();
        let lngs = locations.iter().map(|l| l.lng).collect();
        let (min_lat, max_lat) = range(lats, DEFAULT_CENTER.lat);
        let (min_lng, max_lng) = range(lngs, DEFAULT_CENTER.lng);

        Self {
            min: Location::new(min_lat - MARGIN_DEG, min_lng - MARGIN_DEG),
            max: Location::new(max_lat + MARGIN_DEG, max_lng + MARGIN_DEG),
        }
    }

    /// Position of `location` within the bounds as fractions of the width & height,
    /// with `(0, 0)` in the north-west corner
    pub fn project(&self, location: &Location) -> (f32, f32) {
        let x = (location.lng - self.min.lng) / (self.max.lng - self.min.lng);
        let y = (self.max.lat - location.lat) / (self.max.lat - self.min.lat);

        (x as f32, y as f32)
    }
}

pub fn view<'a>(snapshot: &Snapshot) -> Element<'a, Message> {
    let locations = snapshot
        .riders
        .iter()
        .map(|rider| rider.location)
        .chain(snapshot.orders.iter().map(|order| order.location))
        .collect::<Vec<_>>();
    let bounds = Bounds::around(&locations);

    let riders = snapshot
        .riders
        .iter()
        .map(|rider| {
            let (x, y) = bounds.project(&rider.location);
            (rider.name.clone(), x, y)
        })
        .collect();

    let orders = snapshot
        .orders
        .iter()
        .map(|order| {
            let (x, y) = bounds.project(&order.location);
            (format!("Order {} ({})", order.id, order.status), x, y)
        })
        .collect();

    canvas(MapCanvas {
        riders,
        orders,
        cache: Default::default(),
    })
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

struct MapCanvas {
    riders: Vec<(String, f32, f32)>,
    orders: Vec<(String, f32, f32)>,
    cache: canvas::Cache,
}

impl<Message> canvas::Program<Message, Renderer> for MapCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: iced::Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let size = bounds.size();
        let (width, height) = (size.width - 2.0 * EDGE_PX, size.height - 2.0 * EDGE_PX);
        let to_point = |x: f32, y: f32| Point::new(EDGE_PX + width * x, EDGE_PX + height * y);

        let map = self.cache.draw(renderer, size, |frame| {
            for (label, x, y) in &self.orders {
                let position = to_point(*x, *y);
                frame.fill(&Path::circle(position, 6.0), ORDER_COLOR);
                frame.fill_text(Text {
                    content: label.to_string(),
                    position: Point::new(position.x + 8.0, position.y - 6.0),
                    color: ORDER_COLOR,
                    ..Default::default()
                });
            }

            for (name, x, y) in &self.riders {
                let position = to_point(*x, *y);
                let marker = Path::rectangle(
                    Point::new(position.x - 5.0, position.y - 5.0),
                    Size::new(10.0, 10.0),
                );
                frame.fill(&marker, RIDER_COLOR);
                frame.fill_text(Text {
                    content: name.to_string(),
                    position: Point::new(position.x, position.y + 10.0),
                    color: RIDER_COLOR,
                    ..Default::default()
                });
            }
        });

        vec![map]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_projection_corners() {
        let bounds = Bounds::around(&[
            Location::new(5.60, -0.20),
            Location::new(5.62, -0.18),
        ]);

        let (x, y) = bounds.project(&Location::new(5.62 + MARGIN_DEG, -0.20 - MARGIN_DEG));
        assert!(x.abs() < 1e-4 && y.abs() < 1e-4);

        let (x, y) = bounds.project(&Location::new(5.60 - MARGIN_DEG, -0.18 + MARGIN_DEG));
        assert!((x - 1.0).abs() < 1e-4 && (y - 1.0).abs() < 1e-4);

        let (x, y) = bounds.project(&Location::new(5.61, -0.19));
        assert!((x - 0.5).abs() < 1e-4 && (y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_empty_map_centres_on_default() {
        let bounds = Bounds::around(&[]);

        let (x, y) = bounds.project(&DEFAULT_CENTER);
        assert!((x - 0.5).abs() < 1e-4 && (y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_single_location_is_centred() {
        let only = Location::new(5.6142, -0.2073);
        let (x, y) = Bounds::around(&[only]).project(&only);

        assert!((x - 0.5).abs() < 1e-4 && (y - 0.5).abs() < 1e-4);
    }
}
