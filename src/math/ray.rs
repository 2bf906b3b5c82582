//! Ray type and voxel grid traversal
//!
//! Two walks over the unit voxel grid:
//! - [`walk_segment`] follows the segment between two points with an
//!   error-accumulation DDA and reports each cell together with the one
//!   before it.
//! - [`Ray::walk`] enumerates every cell-boundary crossing along a ray of a
//!   given length, which copes with zero direction components for free.

use std::cmp::Ordering;

use crate::core::types::{IVec3, Result, Vec3, ensure_finite};

/// Visit every cell touched by the segment `p0 -> p1`, in order.
///
/// The visitor receives `(cell, previous_cell)`; the first call has both equal
/// to the start cell. Returning `true` stops the walk and that cell is
/// returned. Otherwise the walk ends on the cell containing `p1`.
///
/// On exact ties the x axis steps before y, and y before z. No step cap is
/// applied; callers bound the segment length.
pub fn walk_segment<F>(p0: Vec3, p1: Vec3, mut visitor: F) -> Result<Option<IVec3>>
where
    F: FnMut(IVec3, IVec3) -> bool,
{
    let p0 = ensure_finite(p0)?.as_dvec3();
    let p1 = ensure_finite(p1)?.as_dvec3();

    // Direction from the unrounded points; a flat axis counts as 1 so the
    // error products below never collapse to zero.
    let delta = |a: f64, b: f64| if a == b { 1.0 } else { b - a };
    let v = [delta(p0.x, p1.x), delta(p0.y, p1.y), delta(p0.z, p1.z)];

    let start = p0.floor().as_ivec3();
    let end = p1.floor().as_ivec3();
    let start = start.to_array();
    let end = end.to_array();
    let origin = p0.to_array();

    let mut step = [0i32; 3];
    let mut err = [0.0f64; 3];
    let mut derr = [0.0f64; 3];
    for axis in 0..3 {
        step[axis] = (end[axis] - start[axis]).signum();
        // Product of the other two direction components
        let cross = v[(axis + 1) % 3] * v[(axis + 2) % 3];
        let boundary = start[axis] + i32::from(end[axis] > start[axis]);
        err[axis] = (boundary as f64 - origin[axis]) * cross;
        derr[axis] = step[axis] as f64 * cross;
    }

    let mut cell = start;
    if visitor(IVec3::from_array(cell), IVec3::from_array(cell)) {
        return Ok(Some(IVec3::from_array(cell)));
    }

    while cell != end {
        // Smallest error among axes still short of their destination; strict
        // comparison keeps the earlier axis on ties.
        let mut axis: Option<usize> = None;
        for candidate in 0..3 {
            if cell[candidate] == end[candidate] {
                continue;
            }
            match axis {
                Some(best) if err[candidate].abs() >= err[best].abs() => {}
                _ => axis = Some(candidate),
            }
        }
        let Some(axis) = axis else { break };

        let prev = cell;
        cell[axis] += step[axis];
        err[axis] += derr[axis];

        if visitor(IVec3::from_array(cell), IVec3::from_array(prev)) {
            return Ok(Some(IVec3::from_array(cell)));
        }
    }

    Ok(None)
}

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// One cell-boundary crossing along a ray
#[derive(Clone, Copy, Debug)]
struct Crossing {
    t: f64,
    axis: usize,
    step: i32,
}

impl Ray {
    /// Create a new ray. The direction is not normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Every boundary crossing for `t in [0, 1]` along
    /// `origin + t * direction * radius`, sorted by `t`.
    fn crossings(&self, radius: f32) -> Vec<Crossing> {
        let origin = self.origin.as_dvec3().to_array();
        let span = (self.direction * radius).as_dvec3().to_array();

        let mut crossings = Vec::new();
        for axis in 0..3 {
            let (o, s) = (origin[axis], span[axis]);
            let end = o + s;
            match s.partial_cmp(&0.0) {
                Some(Ordering::Greater) => {
                    let mut boundary = o.floor() + 1.0;
                    while boundary <= end {
                        crossings.push(Crossing { t: (boundary - o) / s, axis, step: 1 });
                        boundary += 1.0;
                    }
                }
                Some(Ordering::Less) => {
                    let mut boundary = o.floor();
                    while boundary > end {
                        crossings.push(Crossing { t: (boundary - o) / s, axis, step: -1 });
                        boundary -= 1.0;
                    }
                }
                _ => {}
            }
        }

        crossings.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.axis.cmp(&b.axis)));
        crossings
    }

    /// Visit the cells along `origin + t * direction * radius`, `t in [0, 1]`,
    /// starting with the cell containing the origin. Crossings that happen at
    /// the same `t` on several axes merge into a single step.
    ///
    /// Returns the cell on which the visitor returned `true`, if any.
    pub fn walk<F>(&self, radius: f32, mut visitor: F) -> Result<Option<IVec3>>
    where
        F: FnMut(IVec3) -> bool,
    {
        ensure_finite(self.origin)?;
        ensure_finite(self.direction * radius)?;

        let mut cell = self.origin.floor().as_ivec3();
        if visitor(cell) {
            return Ok(Some(cell));
        }

        let crossings = self.crossings(radius);
        let mut i = 0;
        while i < crossings.len() {
            let t = crossings[i].t;
            while i < crossings.len() && crossings[i].t == t {
                cell[crossings[i].axis] += crossings[i].step;
                i += 1;
            }
            if visitor(cell) {
                return Ok(Some(cell));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    fn segment(p0: Vec3, p1: Vec3) -> Vec<IVec3> {
        let mut cells = Vec::new();
        walk_segment(p0, p1, |cell, _| {
            cells.push(cell);
            false
        })
        .unwrap();
        cells
    }

    fn ray_cells(origin: Vec3, direction: Vec3, radius: f32) -> Vec<IVec3> {
        let mut cells = Vec::new();
        Ray::new(origin, direction)
            .walk(radius, |cell| {
                cells.push(cell);
                false
            })
            .unwrap();
        cells
    }

    fn assert_face_connected(cells: &[IVec3]) {
        for pair in cells.windows(2) {
            let d = (pair[1] - pair[0]).abs();
            assert_eq!(d.element_sum(), 1, "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_segment_straight_line() {
        let cells = segment(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(
            cells,
            vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(2, 0, 0),
                IVec3::new(3, 0, 0),
            ]
        );
    }

    #[test]
    fn test_segment_diagonal_tie_steps_x_first() {
        let cells = segment(Vec3::ZERO, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(
            cells,
            vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(1, 1, 0),
                IVec3::new(2, 1, 0),
                IVec3::new(2, 2, 0),
            ]
        );
    }

    #[test]
    fn test_segment_same_cell() {
        let cells = segment(Vec3::new(0.2, 0.3, 0.4), Vec3::new(0.8, 0.9, 0.1));
        assert_eq!(cells, vec![IVec3::ZERO]);
    }

    #[test]
    fn test_segment_negative_direction() {
        let cells = segment(Vec3::new(0.5, 0.5, 0.5), Vec3::new(-2.5, 0.5, 0.5));
        assert_eq!(
            cells,
            vec![
                IVec3::new(0, 0, 0),
                IVec3::new(-1, 0, 0),
                IVec3::new(-2, 0, 0),
                IVec3::new(-3, 0, 0),
            ]
        );
    }

    #[test]
    fn test_segment_3d_is_connected_and_ends_at_target() {
        let p0 = Vec3::new(0.3, 5.7, -1.2);
        let p1 = Vec3::new(6.1, -2.4, 3.9);
        let cells = segment(p0, p1);

        assert_eq!(cells.first(), Some(&IVec3::new(0, 5, -2)));
        assert_eq!(cells.last(), Some(&IVec3::new(6, -3, 3)));
        // Manhattan distance between the end cells plus the start cell
        assert_eq!(cells.len(), 6 + 8 + 5 + 1);
        assert_face_connected(&cells);
    }

    #[test]
    fn test_segment_previous_cell() {
        let mut pairs = Vec::new();
        walk_segment(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), |cell, prev| {
            pairs.push((cell, prev));
            false
        })
        .unwrap();

        assert_eq!(pairs[0], (IVec3::ZERO, IVec3::ZERO));
        assert_eq!(pairs[1], (IVec3::Y, IVec3::ZERO));
        assert_eq!(pairs[2], (IVec3::new(0, 2, 0), IVec3::Y));
    }

    #[test]
    fn test_segment_stops_on_visitor() {
        let mut visited = 0;
        let hit = walk_segment(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), |cell, _| {
            visited += 1;
            cell.x == 4
        })
        .unwrap();

        assert_eq!(hit, Some(IVec3::new(4, 0, 0)));
        assert_eq!(visited, 5);
    }

    #[test]
    fn test_segment_rejects_nan() {
        let result = walk_segment(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE, |_, _| false);
        assert!(matches!(result, Err(Error::InvalidPosition(_))));

        let result = walk_segment(Vec3::ZERO, Vec3::new(0.0, f32::INFINITY, 0.0), |_, _| false);
        assert!(matches!(result, Err(Error::InvalidPosition(_))));
    }

    #[test]
    fn test_ray_axis_aligned() {
        let cells = ray_cells(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 3.0);
        assert_eq!(
            cells,
            vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(2, 0, 0),
                IVec3::new(3, 0, 0),
            ]
        );
    }

    #[test]
    fn test_ray_negative_axis() {
        let cells = ray_cells(Vec3::new(0.5, 2.5, 0.5), Vec3::NEG_Y, 2.0);
        assert_eq!(
            cells,
            vec![IVec3::new(0, 2, 0), IVec3::new(0, 1, 0), IVec3::new(0, 0, 0)]
        );
    }

    #[test]
    fn test_ray_simultaneous_crossings_merge() {
        // Passes exactly through the (1, 1) corner: one diagonal step.
        let cells = ray_cells(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 0.0), 1.0);
        assert_eq!(cells, vec![IVec3::new(0, 0, 0), IVec3::new(1, 1, 0)]);
    }

    #[test]
    fn test_ray_diagonal_is_connected() {
        let direction = Vec3::new(0.6, -0.3, 0.74).normalize();
        let cells = ray_cells(Vec3::new(2.2, 10.4, -3.1), direction, 12.0);

        assert_eq!(cells[0], IVec3::new(2, 10, -4));
        assert_face_connected(&cells);
        let end = (Vec3::new(2.2, 10.4, -3.1) + direction * 12.0).floor().as_ivec3();
        assert_eq!(*cells.last().unwrap(), end);
    }

    #[test]
    fn test_ray_zero_direction_visits_origin_only() {
        let cells = ray_cells(Vec3::new(4.5, 4.5, 4.5), Vec3::ZERO, 5.0);
        assert_eq!(cells, vec![IVec3::splat(4)]);
    }

    #[test]
    fn test_ray_stops_on_visitor() {
        let hit = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::Z)
            .walk(10.0, |cell| cell.z == 3)
            .unwrap();
        assert_eq!(hit, Some(IVec3::new(0, 0, 3)));

        let miss = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::Z)
            .walk(2.0, |cell| cell.z == 3)
            .unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_ray_rejects_non_finite() {
        let ray = Ray::new(Vec3::new(0.0, f32::NAN, 0.0), Vec3::X);
        assert!(matches!(ray.walk(1.0, |_| false), Err(Error::InvalidPosition(_))));

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(matches!(ray.walk(f32::INFINITY, |_| false), Err(Error::InvalidPosition(_))));
    }
}
