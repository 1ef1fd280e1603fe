//! Greedy re-packing of size-bounded parts.
//!
//! Splitting tends to leave many small parts behind. [`consolidate`] groups
//! them back into multi-polygons, first-fit in ascending size order, without
//! letting any group's WKT grow past the limit. Groups are never optimal;
//! downstream chunk numbering relies on this exact order, so keep it.

use geo::{MultiPolygon, Polygon};
use wkt::ToWkt;

use crate::PolygonalGeometry;

/// A parsed part waiting to be placed in a group.
struct Pending {
    text: String,
    polygons: Vec<Polygon<f64>>,
}

/// Packs parts into as few geometries as first-fit allows, each at most
/// `max_len` characters.
///
/// A part that joins no group is returned as its original text. Merged
/// groups are flattened `MULTIPOLYGON`s: members of multi-polygon inputs are
/// added individually, so nothing is ever nested. Unparseable parts are
/// logged and dropped. Parts that already exceed `max_len` pass through
/// alone and unchanged.
#[must_use]
pub fn consolidate(parts: &[String], max_len: usize) -> Vec<String> {
    let mut pending: Vec<Pending> = parts
        .iter()
        .enumerate()
        .filter_map(|(i, text)| match PolygonalGeometry::parse(text) {
            Ok(geometry) => Some(Pending {
                text: text.clone(),
                polygons: geometry.into_polygons(),
            }),
            Err(e) => {
                log::warn!("Dropping unparseable part {} during consolidation: {e}", i + 1);
                None
            }
        })
        .collect();

    pending.sort_by_key(|part| part.text.len());

    let mut groups = Vec::new();

    while !pending.is_empty() {
        let seed = pending.remove(0);
        let mut members = seed.polygons;
        let mut merged = false;
        let mut consumed = vec![false; pending.len()];

        for (candidate, taken) in pending.iter().zip(consumed.iter_mut()) {
            let mut trial = members.clone();
            trial.extend(candidate.polygons.iter().cloned());

            let trial_len = MultiPolygon(trial.clone()).wkt_string().len();
            if trial_len <= max_len {
                members = trial;
                merged = true;
                *taken = true;
            }
        }

        let mut flags = consumed.into_iter();
        pending.retain(|_| !flags.next().unwrap_or(false));

        if merged {
            log::trace!("Consolidated {} polygons into one group", members.len());
            groups.push(MultiPolygon(members).wkt_string());
        } else {
            groups.push(seed.text);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64) -> String {
        format!(
            "POLYGON(({x} {y},{} {y},{} {},{x} {},{x} {y}))",
            x + 1.0,
            x + 1.0,
            y + 1.0,
            y + 1.0
        )
    }

    fn flatten(texts: &[String]) -> Vec<Polygon<f64>> {
        let mut polygons: Vec<Polygon<f64>> = texts
            .iter()
            .flat_map(|t| PolygonalGeometry::parse(t).unwrap().into_polygons())
            .collect();
        polygons.sort_by(|a, b| {
            a.exterior().0[0]
                .x
                .total_cmp(&b.exterior().0[0].x)
                .then(a.exterior().0[0].y.total_cmp(&b.exterior().0[0].y))
        });
        polygons
    }

    #[test]
    fn packs_small_parts_within_bound() {
        let parts: Vec<String> = (0..10).map(|i| square(f64::from(i) * 2.0, 0.0)).collect();
        let part_len = parts.iter().map(String::len).max().unwrap();
        let max_len = part_len * 5;

        let groups = consolidate(&parts, max_len);

        assert!(groups.len() <= 3, "{} groups", groups.len());
        assert!(groups.len() < parts.len());
        for group in &groups {
            assert!(group.len() <= max_len, "{} > {max_len}", group.len());
        }
        assert_eq!(flatten(&groups), flatten(&parts));
    }

    fn polygons_of(text: &str) -> Vec<Polygon<f64>> {
        PolygonalGeometry::parse(text).unwrap().into_polygons()
    }

    #[test]
    fn equal_parts_fill_groups_first_fit_in_input_order() {
        let parts: Vec<String> = (0..10).map(|i| square(f64::from(10 + 2 * i), 0.0)).collect();
        let part_len = parts[0].len();
        assert!(parts.iter().all(|p| p.len() == part_len));

        let groups = consolidate(&parts, part_len * 5);

        assert_eq!(groups.len(), 2, "{groups:?}");
        for group in &groups {
            assert!(group.len() <= part_len * 5);
        }
        let first: Vec<Polygon<f64>> = parts[..5].iter().flat_map(|p| polygons_of(p)).collect();
        let second: Vec<Polygon<f64>> = parts[5..].iter().flat_map(|p| polygons_of(p)).collect();
        assert_eq!(polygons_of(&groups[0]), first);
        assert_eq!(polygons_of(&groups[1]), second);
    }

    #[test]
    fn skipped_candidate_seeds_the_next_group() {
        // Sorted by text: seed, wide, tail. The wide square does not fit
        // next to the seed, but the longer one-member multipolygon adds
        // fewer characters and does.
        let seed = "POLYGON((0 0,1 0,1 1,0 0))".to_string();
        let wide = "POLYGON((0 0,10 0,10 10,0 10,0 0))".to_string();
        let tail = "MULTIPOLYGON(((5 5,6 5,6 6,5 6,5 5)))".to_string();
        assert!(seed.len() < wide.len() && wide.len() < tail.len());

        let with_tail: Vec<Polygon<f64>> =
            polygons_of(&seed).into_iter().chain(polygons_of(&tail)).collect();
        let with_wide: Vec<Polygon<f64>> =
            polygons_of(&seed).into_iter().chain(polygons_of(&wide)).collect();
        let max_len = MultiPolygon(with_tail.clone()).wkt_string().len();
        assert!(MultiPolygon(with_wide).wkt_string().len() > max_len);

        let groups = consolidate(&[tail, wide.clone(), seed], max_len);

        assert_eq!(groups, vec![MultiPolygon(with_tail).wkt_string(), wide]);
    }

    #[test]
    fn lone_multipolygon_part_keeps_its_text() {
        let single = "MULTIPOLYGON(((0 0,1 0,1 1,0 0)))".to_string();
        assert_eq!(consolidate(&[single.clone()], 1_000), vec![single]);
    }

    #[test]
    fn lone_parts_come_back_unchanged() {
        let parts = vec![
            "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
            "POLYGON ((5 5, 6 5, 6 6, 5 6, 5 5))".to_string(),
        ];
        // Too small to hold both, big enough for either.
        let groups = consolidate(&parts, parts[0].len());
        assert_eq!(groups, parts);
    }

    #[test]
    fn groups_start_from_the_smallest_part() {
        let big = "POLYGON((0 0,100 0,100 100,0 100,0 50,0 0))".to_string();
        let small = "POLYGON((1 1,2 1,2 2,1 1))".to_string();
        let groups = consolidate(&[big.clone(), small.clone()], big.len());
        assert_eq!(groups, vec![small, big]);
    }

    #[test]
    fn multipolygon_inputs_are_flattened() {
        let parts = vec![
            "MULTIPOLYGON(((0 0,1 0,1 1,0 0)),((3 3,4 3,4 4,3 3)))".to_string(),
            "POLYGON((8 8,9 8,9 9,8 8))".to_string(),
        ];
        let groups = consolidate(&parts, 10_000);
        assert_eq!(groups.len(), 1);

        let PolygonalGeometry::MultiPolygon(multi) = PolygonalGeometry::parse(&groups[0]).unwrap()
        else {
            panic!("expected multipolygon");
        };
        assert_eq!(multi.0.len(), 3);
    }

    #[test]
    fn unparseable_parts_are_dropped() {
        let parts = vec!["garbage".to_string(), square(0.0, 0.0)];
        assert_eq!(consolidate(&parts, 10_000), vec![square(0.0, 0.0)]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(consolidate(&[], 100).is_empty());
    }
}
