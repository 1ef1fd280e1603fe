//! Size-bounded splitting of polygon WKT.
//!
//! [`split`] drives a FIFO work queue: anything already short enough is
//! finished, multi-polygons are broken into their members, and oversized
//! polygons are bisected along the longer side of their bounding box. The
//! halves go back on the queue and are checked again.

use std::collections::VecDeque;

use geo::{BooleanOps, BoundingRect, Coord, Polygon, Rect};

use crate::{ChunkError, PolygonalGeometry};

/// Length of the shortest WKT a single-ring polygon can have.
pub const MIN_MAX_LEN: usize = "POLYGON((0 0,1 0,0 1,0 0))".len();

/// Bisections after which a polygon is treated as irreducible.
///
/// 128 halvings take any coordinate extent below `f64` resolution, so
/// reaching this depth means the text cannot be brought under the limit.
pub const MAX_BISECTION_DEPTH: u32 = 128;

/// Hole-free polygons whose ring has at most this many coordinates (a
/// closed quadrilateral) do not shrink under bisection.
pub const IRREDUCIBLE_RING_COORDS: usize = 5;

/// Total queue pops allowed for one call to [`split`].
pub const MAX_SPLIT_STEPS: usize = 1 << 24;

/// Queued geometry text plus the number of bisections that produced it.
struct WorkItem {
    text: String,
    depth: u32,
}

/// Splits a polygon or multi-polygon into parts of at most `max_len`
/// characters each.
///
/// Input that already fits is returned unchanged as the only part. Parts
/// come back in the order they were finalized, which is not the spatial
/// order of the input.
///
/// Unparseable intermediate text is logged and dropped.
///
/// # Errors
///
/// Returns [`ChunkError::Configuration`] if `max_len` is below
/// [`MIN_MAX_LEN`], or if a polygon cannot be made smaller by bisection:
/// a triangle or quadrilateral that is still too long, a zero-extent
/// bounding box, a split that makes no progress, more than
/// [`MAX_BISECTION_DEPTH`] bisections, or more than [`MAX_SPLIT_STEPS`]
/// queue steps overall.
pub fn split(geometry_text: &str, max_len: usize) -> Result<Vec<String>, ChunkError> {
    check_max_len(max_len)?;

    let mut queue = VecDeque::from([WorkItem {
        text: geometry_text.to_string(),
        depth: 0,
    }]);
    let mut parts = Vec::new();
    let mut steps = 0usize;

    while let Some(item) = queue.pop_front() {
        steps += 1;
        if steps > MAX_SPLIT_STEPS {
            return Err(ChunkError::configuration(format!(
                "split exceeded {MAX_SPLIT_STEPS} steps with {} items still queued \
                 (max_len={max_len})",
                queue.len() + 1
            )));
        }

        if item.text.len() <= max_len {
            parts.push(item.text);
            continue;
        }

        let geometry = match PolygonalGeometry::parse(&item.text) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::warn!(
                    "Dropping unparseable part ({} chars) during split: {e}",
                    item.text.len()
                );
                continue;
            }
        };

        match geometry {
            PolygonalGeometry::MultiPolygon(multi) => {
                log::trace!(
                    "Decomposing multipolygon of {} members at depth {}",
                    multi.0.len(),
                    item.depth
                );
                for polygon in multi.0 {
                    queue.push_back(WorkItem {
                        text: PolygonalGeometry::Polygon(polygon).to_wkt(),
                        depth: item.depth,
                    });
                }
            }
            PolygonalGeometry::Polygon(polygon) => {
                let coords = polygon.exterior().0.len();
                if polygon.interiors().is_empty() && coords <= IRREDUCIBLE_RING_COORDS {
                    return Err(ChunkError::configuration(format!(
                        "polygon with {coords} ring coordinates is {} chars and cannot be \
                         split below max_len={max_len}",
                        item.text.len()
                    )));
                }

                if item.depth >= MAX_BISECTION_DEPTH {
                    return Err(ChunkError::configuration(format!(
                        "polygon still {} chars after {MAX_BISECTION_DEPTH} bisections \
                         (max_len={max_len})",
                        item.text.len()
                    )));
                }

                for half in bisect(&polygon)? {
                    queue.push_back(WorkItem {
                        text: half.to_wkt(),
                        depth: item.depth + 1,
                    });
                }
            }
        }
    }

    Ok(parts)
}

/// Fails if `max_len` is too small for any polygon to fit.
///
/// # Errors
///
/// Returns [`ChunkError::Configuration`] if `max_len` is below
/// [`MIN_MAX_LEN`].
pub fn check_max_len(max_len: usize) -> Result<(), ChunkError> {
    if max_len < MIN_MAX_LEN {
        return Err(ChunkError::configuration(format!(
            "max_len {max_len} is below the minimum polygon length {MIN_MAX_LEN}"
        )));
    }
    Ok(())
}

/// Cuts a polygon in two along the longer side of its bounding box.
///
/// Returns the non-empty halves: the part inside the lower-half blade
/// first, then the remainder.
fn bisect(polygon: &Polygon<f64>) -> Result<Vec<PolygonalGeometry>, ChunkError> {
    let Some(bbox) = polygon.bounding_rect() else {
        log::warn!("Dropping empty polygon during split");
        return Ok(Vec::new());
    };

    if bbox.width() == 0.0 && bbox.height() == 0.0 {
        return Err(ChunkError::configuration(format!(
            "cannot bisect polygon with zero-extent bounding box at ({}, {})",
            bbox.min().x,
            bbox.min().y
        )));
    }

    let blade = blade_for(&bbox).to_polygon();
    let halves: Vec<PolygonalGeometry> = [polygon.intersection(&blade), polygon.difference(&blade)]
        .into_iter()
        .map(|multi| PolygonalGeometry::from_polygons(multi.0))
        .filter(|half| !half.is_empty())
        .collect();

    match halves.as_slice() {
        [] => log::warn!("Dropping zero-area polygon with bounding box {bbox:?} during split"),
        [only] if only.bounding_rect() == Some(bbox) => {
            return Err(ChunkError::configuration(format!(
                "bisection made no progress on polygon with bounding box {bbox:?}"
            )));
        }
        _ => {}
    }

    Ok(halves)
}

/// Rectangle covering the lower half of `bbox` along its longer axis.
///
/// Ties go to the x axis, giving a vertical cut.
fn blade_for(bbox: &Rect<f64>) -> Rect<f64> {
    let min = bbox.min();
    let max = bbox.max();

    if bbox.width() >= bbox.height() {
        let mid_x = min.x + bbox.width() / 2.0;
        Rect::new(min, Coord { x: mid_x, y: max.y })
    } else {
        let mid_y = min.y + bbox.height() / 2.0;
        Rect::new(min, Coord { x: max.x, y: mid_y })
    }
}
