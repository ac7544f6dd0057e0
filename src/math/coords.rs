//! Algorithms on raw coordinate lists.
//!
//! Rings are handled as plain coordinate vectors here, closed by repeating
//! the first coordinate at the end. Closure is preserved by every function
//! that removes or replaces coordinates.

use super::{dist, same_coord, triangle_area, Point2, AREA_EPSILON};

/// A coordinate merge produced by radial simplification.
///
/// Whenever two consecutive coordinates are merged, the dropped coordinate
/// and the surviving one are recorded so the same substitution can be
/// pushed into any other ring that contains the dropped coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Substitution {
    /// The coordinate that was removed.
    pub removed: Point2,
    /// The coordinate it was merged into.
    pub kept: Point2,
}

/// Removes repeated coordinates, keeping the first occurrence of each.
///
/// If the input is a closed ring (first == last), the result is re-closed.
#[must_use]
pub fn remove_duplicates(coords: &[Point2]) -> Vec<Point2> {
    let Some(first) = coords.first() else {
        return Vec::new();
    };
    let closed = same_coord(first, &coords[coords.len() - 1]);

    let mut unique: Vec<Point2> = Vec::with_capacity(coords.len());
    for c in coords {
        if !unique.iter().any(|u| same_coord(u, c)) {
            unique.push(*c);
        }
    }
    if closed && !unique.is_empty() {
        unique.push(unique[0]);
    }
    unique
}

/// Returns `true` if any consecutive pair is closer together than `tol`.
#[must_use]
pub fn within_tolerance(coords: &[Point2], tol: f64) -> bool {
    coords
        .windows(2)
        .any(|pair| dist(&pair[0], &pair[1]) < tol)
}

/// Removes every occurrence of `item`, respecting ring closure.
#[must_use]
pub fn remove_item(coords: &[Point2], item: &Point2) -> Vec<Point2> {
    let closed = coords.len() > 1 && same_coord(&coords[0], &coords[coords.len() - 1]);
    let mut amended: Vec<Point2> = coords
        .iter()
        .filter(|c| !same_coord(c, item))
        .copied()
        .collect();
    if closed && !amended.is_empty() && !same_coord(&amended[0], &amended[amended.len() - 1]) {
        amended.push(amended[0]);
    }
    amended
}

/// Removes every coordinate listed in `items`, respecting ring closure.
#[must_use]
pub fn remove_items(coords: &[Point2], items: &[Point2]) -> Vec<Point2> {
    let mut out = coords.to_vec();
    for item in items {
        out = remove_item(&out, item);
    }
    out
}

/// One step of radial distance simplification.
///
/// Scans consecutive pairs in order; on the first pair closer than `tol`,
/// drops the second coordinate of the pair — unless the pair is the ring's
/// last segment, in which case the first is dropped. The tie-break is
/// asymmetric and not distance-optimal, but downstream shared-edge
/// consistency depends on it being deterministic, so it is kept as is.
///
/// Returns the amended list and the `(removed, kept)` substitution, or the
/// input unchanged and `None` if no pair qualifies.
#[must_use]
pub fn radial_simplify_once(coords: &[Point2], tol: f64) -> (Vec<Point2>, Option<Substitution>) {
    for i in 0..coords.len().saturating_sub(1) {
        let first = coords[i];
        let second = coords[i + 1];
        if dist(&first, &second) < tol {
            let (removed, kept) = if i < coords.len() - 2 {
                (second, first)
            } else {
                (first, second)
            };
            let amended = remove_item(coords, &removed);
            return (amended, Some(Substitution { removed, kept }));
        }
    }
    (coords.to_vec(), None)
}

/// Applies radial simplification until the coordinate list settles.
///
/// The scan restarts from the beginning after every removal and stops when
/// a pass removes nothing or fewer than 4 coordinates remain (a closed
/// triangle). Every substitution produced is appended to `substitutions`.
#[must_use]
pub fn simplify_to_fixpoint(
    coords: &[Point2],
    tol: f64,
    substitutions: &mut Vec<Substitution>,
) -> Vec<Point2> {
    let mut coords = coords.to_vec();
    let mut previous_len = coords.len() + 1;
    while coords.len() < previous_len && coords.len() > 3 {
        previous_len = coords.len();
        let (amended, sub) = radial_simplify_once(&coords, tol);
        coords = amended;
        if let Some(sub) = sub {
            substitutions.push(sub);
        }
    }
    coords
}

/// Applies recorded substitutions to a coordinate list.
///
/// Every occurrence of a removed coordinate is replaced by its kept
/// counterpart, then duplicates are washed out. Used to push edits from one
/// ring into a neighboring ring that shares the removed coordinate.
#[must_use]
pub fn apply_substitutions(coords: &[Point2], substitutions: &[Substitution]) -> Vec<Point2> {
    let mut out = coords.to_vec();
    for sub in substitutions {
        for c in &mut out {
            if same_coord(c, &sub.removed) {
                *c = sub.kept;
            }
        }
    }
    remove_duplicates(&out)
}

/// Replaces coordinates flagged for removal with their nearest replacement.
///
/// Each occurrence of a coordinate in `removed` is substituted by the
/// closest coordinate from `fresh`, then duplicates are washed out. Used to
/// mirror a kernel-side validity cleanup into touching neighbors, where the
/// cleanup introduced new coordinates without producing substitutions.
#[must_use]
pub fn replace_with_nearest(
    coords: &[Point2],
    fresh: &[Point2],
    removed: &[Point2],
) -> Vec<Point2> {
    let Some(first_fresh) = fresh.first() else {
        return remove_duplicates(coords);
    };
    let mut out = coords.to_vec();
    for r in removed {
        for c in &mut out {
            if !same_coord(c, r) {
                continue;
            }
            let mut replacement = *first_fresh;
            let mut minimum = dist(r, first_fresh);
            for candidate in fresh {
                let d = dist(r, candidate);
                if d < minimum {
                    minimum = d;
                    replacement = *candidate;
                }
            }
            *c = replacement;
        }
    }
    remove_duplicates(&out)
}

/// Flags collinear middle points in a sliding window of three coordinates.
///
/// A middle point is flagged when the triangle spanned by the window has
/// effectively zero area. Single pass; callers that need cyclic coverage
/// extend the list across the closure themselves.
#[must_use]
pub fn collinear_points(coords: &[Point2]) -> Vec<Point2> {
    let mut flagged = Vec::new();
    if coords.len() >= 3 {
        for window in coords.windows(3) {
            if triangle_area(&window[0], &window[1], &window[2]) <= AREA_EPSILON {
                flagged.push(window[1]);
            }
        }
    }
    flagged
}

/// Reverses a closed coordinate loop if it is not counter-clockwise.
#[must_use]
pub fn ensure_ccw(coords: &[Point2]) -> Vec<Point2> {
    if super::signed_area(coords) < 0.0 {
        coords.iter().rev().copied().collect()
    } else {
        coords.to_vec()
    }
}
