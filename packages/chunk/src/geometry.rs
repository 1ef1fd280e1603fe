//! Polygonal geometry values parsed from WKT.
//!
//! [`PolygonalGeometry`] is the only in-memory shape the chunking core
//! works with. Anything that is not a polygon or multi-polygon is rejected
//! at parse time.

use geo::{BoundingRect, Geometry, MultiPolygon, Polygon, Rect};
use wkb::writer::geometry_wkb_size;
use wkt::{ToWkt, TryFromWkt};

use crate::ChunkError;

/// A parsed polygon or multi-polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonalGeometry {
    /// One outer ring with zero or more holes.
    Polygon(Polygon<f64>),
    /// An ordered collection of polygons.
    MultiPolygon(MultiPolygon<f64>),
}

impl PolygonalGeometry {
    /// Parses WKT into a polygon or multi-polygon.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::Parse`] if the text is not valid WKT or holds
    /// any other geometry type.
    pub fn parse(text: &str) -> Result<Self, ChunkError> {
        let geometry =
            Geometry::<f64>::try_from_wkt_str(text).map_err(|e| ChunkError::Parse {
                message: e.to_string(),
            })?;

        match geometry {
            Geometry::Polygon(polygon) => Ok(Self::Polygon(polygon)),
            Geometry::MultiPolygon(multi) => Ok(Self::MultiPolygon(multi)),
            other => Err(ChunkError::Parse {
                message: format!("unsupported geometry type: {}", geometry_kind(&other)),
            }),
        }
    }

    /// Builds a geometry from loose polygons.
    ///
    /// A single polygon stays a `Polygon`; zero or several become a
    /// `MultiPolygon`.
    #[must_use]
    pub fn from_polygons(mut polygons: Vec<Polygon<f64>>) -> Self {
        if polygons.len() == 1 {
            Self::Polygon(polygons.swap_remove(0))
        } else {
            Self::MultiPolygon(MultiPolygon(polygons))
        }
    }

    /// The member polygons, in order.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            Self::Polygon(polygon) => std::slice::from_ref(polygon),
            Self::MultiPolygon(multi) => &multi.0,
        }
    }

    /// Consumes the geometry and returns its member polygons.
    #[must_use]
    pub fn into_polygons(self) -> Vec<Polygon<f64>> {
        match self {
            Self::Polygon(polygon) => vec![polygon],
            Self::MultiPolygon(multi) => multi.0,
        }
    }

    /// `true` if no member polygon has any coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons()
            .iter()
            .all(|polygon| polygon.exterior().0.is_empty())
    }

    /// Axis-aligned bounding box, or `None` for an empty geometry.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Polygon(polygon) => polygon.bounding_rect(),
            Self::MultiPolygon(multi) => multi.bounding_rect(),
        }
    }

    /// Serializes to WKT.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        match self {
            Self::Polygon(polygon) => polygon.wkt_string(),
            Self::MultiPolygon(multi) => multi.wkt_string(),
        }
    }

    /// Length of [`Self::to_wkt`] in characters.
    #[must_use]
    pub fn wkt_len(&self) -> usize {
        self.to_wkt().len()
    }

    /// Size in bytes of the ISO WKB encoding.
    #[must_use]
    pub fn wkb_len(&self) -> usize {
        match self {
            Self::Polygon(polygon) => geometry_wkb_size(polygon),
            Self::MultiPolygon(multi) => geometry_wkb_size(multi),
        }
    }
}

const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
