//! Geodesic area on the WGS84 ellipsoid.

use geo::GeodesicArea;
use geo::algorithm::orient::{Direction, Orient};

use crate::PolygonalGeometry;

/// Unsigned geodesic area in square meters.
///
/// Coordinates are read as `(longitude, latitude)` degrees. Each member
/// polygon is oriented to the standard winding before measuring, so ring
/// direction in the input never changes the result.
#[must_use]
pub fn geodesic_area(geometry: &PolygonalGeometry) -> f64 {
    geometry
        .polygons()
        .iter()
        .map(|polygon| {
            polygon
                .orient(Direction::Default)
                .geodesic_area_signed()
                .abs()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(wkt: &str) -> f64 {
        geodesic_area(&PolygonalGeometry::parse(wkt).unwrap())
    }

    #[test]
    fn one_degree_cell_at_equator() {
        // A 1x1 degree cell at the equator is roughly 12,300 km^2.
        let area = area_of("POLYGON((0 0,1 0,1 1,0 1,0 0))");
        assert!((area - 12_308_778_361.0).abs() / area < 1e-3, "{area}");
    }

    #[test]
    fn winding_order_does_not_matter() {
        let ccw = area_of("POLYGON((0 0,1 0,1 1,0 1,0 0))");
        let cw = area_of("POLYGON((0 0,0 1,1 1,1 0,0 0))");
        assert!((ccw - cw).abs() < 1e-6);
        assert!(cw > 0.0);
    }

    #[test]
    fn holes_are_subtracted() {
        let solid = area_of("POLYGON((0 0,2 0,2 2,0 2,0 0))");
        let holed = area_of("POLYGON((0 0,2 0,2 2,0 2,0 0),(0.5 0.5,1.5 0.5,1.5 1.5,0.5 1.5,0.5 0.5))");
        let hole = area_of("POLYGON((0.5 0.5,1.5 0.5,1.5 1.5,0.5 1.5,0.5 0.5))");
        assert!(((solid - hole) - holed).abs() / solid < 1e-9);
    }

    #[test]
    fn multipolygon_sums_members() {
        let a = area_of("POLYGON((0 0,1 0,1 1,0 1,0 0))");
        let b = area_of("POLYGON((10 10,11 10,11 11,10 11,10 10))");
        let both = area_of(
            "MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)),((10 10,10 11,11 11,11 10,10 10)))",
        );
        assert!(((a + b) - both).abs() / both < 1e-9);
    }

    #[test]
    fn empty_geometry_has_no_area() {
        assert!(geodesic_area(&PolygonalGeometry::from_polygons(Vec::new())).abs() < f64::EPSILON);
    }
}
