//! # Projection
//!
//! Maps geographic positions into a normalized `[0, 1] x [0, 1]` viewport
//! whose window is derived from the fleet itself.

use serde::{Deserialize, Serialize};

use crate::model::Position;

/// Default padding, in degrees, added around the fleet.
pub const DEFAULT_PADDING: f64 = 0.005;

/// Normalized viewport coordinates. `(0, 0)` is the top-left (north-west)
/// corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    /// Whether the point lands inside the visible viewport.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Geographic window mapped onto the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Bounds {
    /// Window used when there is nothing to fit.
    pub const UNIT: Self = Self { min_lat: 0.0, max_lat: 1.0, min_lng: 0.0, max_lng: 1.0 };

    /// Smallest window containing every position, grown by `padding` degrees
    /// on each side. An empty input yields [`Bounds::UNIT`].
    pub fn fit(positions: impl IntoIterator<Item = Position>, padding: f64) -> Self {
        let mut positions = positions.into_iter();
        let Some(first) = positions.next() else {
            return Self::UNIT;
        };

        let init = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lng: first.longitude,
            max_lng: first.longitude,
        };
        let tight = positions.fold(init, |b, p| Self {
            min_lat: b.min_lat.min(p.latitude),
            max_lat: b.max_lat.max(p.latitude),
            min_lng: b.min_lng.min(p.longitude),
            max_lng: b.max_lng.max(p.longitude),
        });

        Self {
            min_lat: tight.min_lat - padding,
            max_lat: tight.max_lat + padding,
            min_lng: tight.min_lng - padding,
            max_lng: tight.max_lng + padding,
        }
    }

    /// Project a position into the viewport.
    ///
    /// North is up, so `y` is inverted. Results are not clamped: a position
    /// outside the window lands outside `[0, 1]`. An axis with zero span maps
    /// to the viewport center.
    #[must_use]
    pub fn project(&self, position: Position) -> Point {
        Point {
            x: normalize(position.longitude, self.min_lng, self.max_lng),
            y: 1.0 - normalize(position.latitude, self.min_lat, self.max_lat),
        }
    }
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span.abs() <= f64::EPSILON || !span.is_finite() {
        return 0.5;
    }
    (value - min) / span
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn empty_fleet_uses_unit_box() {
        assert_eq!(Bounds::fit(Vec::<Position>::new(), DEFAULT_PADDING), Bounds::UNIT);
    }

    #[test]
    fn two_vehicle_scenario() {
        let a = Position::new(10.0, 20.0);
        let b = Position::new(10.01, 20.01);
        let bounds = Bounds::fit([a, b], DEFAULT_PADDING);

        assert!(close(bounds.min_lat, 9.995));
        assert!(close(bounds.max_lat, 10.015));
        assert!(close(bounds.min_lng, 19.995));
        assert!(close(bounds.max_lng, 20.015));

        let pa = bounds.project(a);
        assert!(close(pa.x, 0.25), "a.x = {}", pa.x);
        assert!(close(pa.y, 0.75), "a.y = {}", pa.y);

        let pb = bounds.project(b);
        assert!(close(pb.x, 0.75), "b.x = {}", pb.x);
        assert!(close(pb.y, 0.25), "b.y = {}", pb.y);
    }

    #[test]
    fn single_entity_is_centered() {
        let p = Position::new(-36.8485, 174.7633);
        let bounds = Bounds::fit([p], DEFAULT_PADDING);
        let point = bounds.project(p);

        assert!(close(point.x, 0.5));
        assert!(close(point.y, 0.5));
    }

    #[test]
    fn degenerate_box_is_centered() {
        let p = Position::new(5.0, 5.0);
        let bounds = Bounds::fit([p, p], 0.0);

        assert_eq!(bounds.project(p), Point::CENTER);
        assert_eq!(bounds.project(Position::new(6.0, 7.0)), Point::CENTER);
    }

    #[test]
    fn degenerate_single_axis() {
        // same latitude, different longitude
        let bounds = Bounds::fit([Position::new(1.0, 1.0), Position::new(1.0, 3.0)], 0.0);
        let point = bounds.project(Position::new(1.0, 2.0));

        assert!(close(point.x, 0.5));
        assert!(close(point.y, 0.5));
        assert!(!point.x.is_nan() && !point.y.is_nan());
    }

    #[test]
    fn longitude_is_monotonic() {
        let positions = [
            Position::new(0.0, -10.0),
            Position::new(0.0, -1.0),
            Position::new(0.0, 0.5),
            Position::new(0.0, 30.0),
        ];
        let bounds = Bounds::fit(positions, DEFAULT_PADDING);
        let xs: Vec<f64> = positions.iter().map(|p| bounds.project(*p).x).collect();

        assert!(xs.windows(2).all(|w| w[0] <= w[1]), "{xs:?}");
    }

    #[test]
    fn north_is_up() {
        let south = Position::new(-1.0, 0.0);
        let north = Position::new(1.0, 0.0);
        let bounds = Bounds::fit([south, north], DEFAULT_PADDING);

        assert!(bounds.project(north).y < bounds.project(south).y);
    }

    #[test]
    fn fleet_projects_inside_viewport() {
        let positions = [
            Position::new(-36.84, 174.76),
            Position::new(-36.91, 174.70),
            Position::new(-36.80, 174.81),
        ];
        let bounds = Bounds::fit(positions, DEFAULT_PADDING);
        assert!(positions.iter().all(|p| bounds.project(*p).is_visible()));

        // positions outside the window are not clamped
        let outside = bounds.project(Position::new(-37.5, 175.5));
        assert!(!outside.is_visible());
        assert!(outside.x > 1.0 && outside.y > 1.0);
    }
}
