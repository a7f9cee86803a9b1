//! Coordinate projections and bounding boxes
//!
//! Two planar projections live here:
//!
//! - [`latlng_to_xy`] maps degrees onto the unit-less poster plane (x in `[0, 2]`, y growing
//!   southwards) that tracks are scaled from when drawn.
//! - [`wgs84_to_mercator`] maps degrees onto Web Mercator meters; the parser uses it to simplify
//!   geometry with a tolerance expressed in square meters.

use geo::{Coord, LineString, Point, Rect};
use std::f64::consts::PI;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Earth's equatorial radius in meters (WGS84)
const EARTH_RADIUS_M: f64 = 6378137.0;

/// Length of one degree of arc on the equator
const ONE_DEGREE_M: f64 = 2.0 * PI * EARTH_RADIUS_M / 360.0;

/// Above this many degrees on either axis, [`distance_2d`] stops using the planar approximation
const PLANAR_MAX_DEGREES: f64 = 0.2;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / PI;

/// Project a WGS84 (lat, lng) pair onto the poster plane
///
/// `x = lng/180 + 1` and `y = 0.5 - ln(tan(pi/4 * (1 + lat/90))) / pi`. The result is infinite at
/// the poles, so callers must not pass a latitude of ±90.
#[inline(always)]
pub fn latlng_to_xy(lat: f64, lng: f64) -> Coord<f64> {
    Coord {
        x: lng / 180.0 + 1.0,
        y: 0.5 - (PI / 4.0 * (1.0 + lat / 90.0)).tan().ln() / PI,
    }
}

/// Project every point of every polyline onto the poster plane
///
/// Polylines store longitude in `x` and latitude in `y`.
pub fn project_polylines(polylines: &[LineString<f64>]) -> Vec<Vec<Coord<f64>>> {
    polylines
        .iter()
        .map(|line| line.coords().map(|c| latlng_to_xy(c.y, c.x)).collect())
        .collect()
}

/// Compute the axis-aligned bounds of a set of projected polylines
///
/// Returns `None` when there is no point at all.
pub fn compute_bounds(polylines: &[Vec<Coord<f64>>]) -> Option<Rect<f64>> {
    let mut points = polylines.iter().flatten();
    let first = *points.next()?;
    let (min, max) = points.fold((first, first), |(min, max), p| {
        (
            Coord {
                x: min.x.min(p.x),
                y: min.y.min(p.y),
            },
            Coord {
                x: max.x.max(p.x),
                y: max.y.max(p.y),
            },
        )
    });
    Some(Rect::new(min, max))
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the range Web Mercator can represent.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;
    Point::new(x, y)
}

/// Great-circle distance between two (lon, lat) points in meters
#[inline]
pub fn haversine_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance between two consecutive (lon, lat) recording points in meters, ignoring elevation
///
/// Close points use an equirectangular approximation scaled by the cosine of the first point's
/// latitude. Points more than 0.2° apart on either axis use [`haversine_distance`].
#[inline]
pub fn distance_2d(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let d_lat = p1.y() - p2.y();
    let d_lon = p1.x() - p2.x();
    if d_lat.abs() > PLANAR_MAX_DEGREES || d_lon.abs() > PLANAR_MAX_DEGREES {
        return haversine_distance(p1, p2);
    }
    let coef = p1.y().to_radians().cos();
    d_lat.hypot(d_lon * coef) * ONE_DEGREE_M
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_to_xy_origin() {
        let p = latlng_to_xy(0.0, 0.0);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_latlng_to_xy_longitude_range() {
        assert!((latlng_to_xy(0.0, -180.0).x - 0.0).abs() < 1e-12);
        assert!((latlng_to_xy(0.0, 180.0).x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_x_strictly_increasing_in_lng() {
        let mut prev = f64::NEG_INFINITY;
        for i in -180..=180 {
            let x = latlng_to_xy(47.0, i as f64).x;
            assert!(x > prev, "x not increasing at lng {i}");
            prev = x;
        }
    }

    #[test]
    fn test_y_strictly_decreasing_in_lat() {
        let mut prev = f64::INFINITY;
        for i in -89..=89 {
            let y = latlng_to_xy(i as f64, 8.0).y;
            assert!(y < prev, "y not decreasing at lat {i}");
            prev = y;
        }
    }

    #[test]
    fn test_compute_bounds() {
        let lines = vec![
            vec![Coord { x: 1.0, y: 5.0 }, Coord { x: 3.0, y: 2.0 }],
            vec![Coord { x: -1.0, y: 4.0 }],
        ];
        let bounds = compute_bounds(&lines).unwrap();
        assert_eq!(bounds.min(), Coord { x: -1.0, y: 2.0 });
        assert_eq!(bounds.max(), Coord { x: 3.0, y: 5.0 });
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
        assert!(compute_bounds(&[Vec::new(), Vec::new()]).is_none());
    }

    #[test]
    fn test_project_polylines_swaps_axes() {
        let line = LineString::from(vec![(90.0, 0.0)]);
        let projected = project_polylines(&[line]);
        assert!((projected[0][0].x - 1.5).abs() < 1e-12);
        assert!((projected[0][0].y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_wgs84_to_mercator_bounds() {
        let west = wgs84_to_mercator(0.0, -180.0);
        assert!((west.x() + EARTH_MERCATOR_MAX).abs() < 1.0);

        let east = wgs84_to_mercator(0.0, 180.0);
        assert!((east.x() - EARTH_MERCATOR_MAX).abs() < 1.0);
    }

    #[test]
    fn test_haversine_one_hundredth_degree() {
        let d = haversine_distance(Point::new(8.0, 47.0), Point::new(8.0, 47.01));
        assert!((d - 1113.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_distance_2d_along_meridian() {
        let d = distance_2d(Point::new(8.0, 47.0), Point::new(8.0, 47.01));
        assert!((d - 0.01 * ONE_DEGREE_M).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn test_distance_2d_shrinks_longitude_with_latitude() {
        // cos(60°) = 0.5
        let d = distance_2d(Point::new(8.0, 60.0), Point::new(8.1, 60.0));
        assert!((d - 0.05 * ONE_DEGREE_M).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn test_distance_2d_far_points_use_haversine() {
        let (a, b) = (Point::new(8.0, 47.0), Point::new(8.0, 48.0));
        assert_eq!(distance_2d(a, b), haversine_distance(a, b));

        let (a, b) = (Point::new(8.0, 47.0), Point::new(8.3, 47.0));
        assert_eq!(distance_2d(a, b), haversine_distance(a, b));
    }
}
