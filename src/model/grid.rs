//! Uniform spatial binning for fixed-radius neighbor queries.
//!
//! Pair enumeration bins base-frame origins with the coarse cutoff as cell size, and the helix
//! builder bins phosphorus atoms with the backbone join distance. Both only ever ask "which
//! items lie within `r` of this point", which is the single query [`Grid`] answers.

use super::types::Point;
use nalgebra::Vector3;

const EMPTY: u32 = u32::MAX;

/// Cubic-cell grid storing items in per-cell singly linked lists.
///
/// Construction is **O(N)**. A query visits the block of cells overlapping the query cube and
/// filters by exact Euclidean distance.
#[derive(Debug, Clone)]
pub struct Grid<T> {
    cell_size: f64,
    lower: Point,
    dims: [usize; 3],
    /// First item index per cell.
    head: Vec<u32>,
    /// Next item index in the same cell.
    next: Vec<u32>,
    items: Vec<(Point, T)>,
}

impl<T> Grid<T> {
    /// Bins the provided items into cells of side `cell_size`.
    ///
    /// # Arguments
    ///
    /// * `items` - Iterator yielding `(position, item)` pairs.
    /// * `cell_size` - Side length of each cubic cell in ångströms.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not strictly positive.
    pub fn new(items: impl IntoIterator<Item = (Point, T)>, cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "Cell size must be positive");

        let items: Vec<(Point, T)> = items.into_iter().collect();
        if items.is_empty() {
            return Self {
                cell_size,
                lower: Point::origin(),
                dims: [0; 3],
                head: Vec::new(),
                next: Vec::new(),
                items,
            };
        }

        let mut lower = items[0].0;
        let mut upper = items[0].0;
        for (pos, _) in &items {
            lower = lower.inf(pos);
            upper = upper.sup(pos);
        }

        let extent = upper - lower;
        let dims = [
            (extent.x / cell_size).floor() as usize + 1,
            (extent.y / cell_size).floor() as usize + 1,
            (extent.z / cell_size).floor() as usize + 1,
        ];

        let mut grid = Self {
            cell_size,
            lower,
            dims,
            head: vec![EMPTY; dims[0] * dims[1] * dims[2]],
            next: vec![EMPTY; items.len()],
            items: Vec::new(),
        };

        for (index, (pos, _)) in items.iter().enumerate() {
            let [x, y, z] = grid.clamped_cell(pos);
            let cell = grid.flat_index(x, y, z);
            grid.next[index] = grid.head[cell];
            grid.head[cell] = index as u32;
        }
        grid.items = items;
        grid
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collects every item whose position lies within `radius` of `center`, inclusive.
    ///
    /// # Arguments
    ///
    /// * `center` - Query point.
    /// * `radius` - Search radius in ångströms.
    ///
    /// # Returns
    ///
    /// `(position, &item)` tuples in cell-scan order. Callers needing a canonical order sort
    /// the result themselves.
    pub fn within(&self, center: &Point, radius: f64) -> Vec<(Point, &T)> {
        let mut found = Vec::new();
        if self.items.is_empty() {
            return found;
        }

        let span = Vector3::new(radius, radius, radius);
        let low = self.clamped_cell(&(center - span));
        let high = self.clamped_cell(&(center + span));
        let radius_sq = radius * radius;

        for z in low[2]..=high[2] {
            for y in low[1]..=high[1] {
                for x in low[0]..=high[0] {
                    let mut cursor = self.head[self.flat_index(x, y, z)];
                    while cursor != EMPTY {
                        let (pos, item) = &self.items[cursor as usize];
                        if nalgebra::distance_squared(pos, center) <= radius_sq {
                            found.push((*pos, item));
                        }
                        cursor = self.next[cursor as usize];
                    }
                }
            }
        }

        found
    }

    fn clamped_cell(&self, pos: &Point) -> [usize; 3] {
        let offset = pos - self.lower;
        let axis = |value: f64, dim: usize| -> usize {
            let cell = (value / self.cell_size).floor();
            if cell <= 0.0 {
                0
            } else {
                (cell as usize).min(dim - 1)
            }
        };
        [
            axis(offset.x, self.dims[0]),
            axis(offset.y, self.dims[1]),
            axis(offset.z, self.dims[2]),
        ]
    }

    fn flat_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dims[0] + z * self.dims[0] * self.dims[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_returns_no_neighbors() {
        let grid: Grid<usize> = Grid::new(Vec::new(), 2.0);
        assert!(grid.is_empty());
        assert!(grid.within(&Point::origin(), 10.0).is_empty());
    }

    #[test]
    fn within_filters_by_exact_distance() {
        let grid = Grid::new(
            vec![
                (Point::new(0.0, 0.0, 0.0), 0usize),
                (Point::new(1.0, 0.0, 0.0), 1),
                (Point::new(1.9, 1.9, 0.0), 2),
                (Point::new(10.0, 0.0, 0.0), 3),
            ],
            2.0,
        );

        let mut hits: Vec<usize> = grid
            .within(&Point::origin(), 2.0)
            .into_iter()
            .map(|(_, id)| *id)
            .collect();
        hits.sort_unstable();

        assert_eq!(hits, vec![0, 1]);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn within_includes_points_on_the_boundary() {
        let grid = Grid::new(vec![(Point::new(3.0, 4.0, 0.0), "edge")], 1.0);
        assert_eq!(grid.within(&Point::origin(), 5.0).len(), 1);
    }

    #[test]
    fn queries_outside_the_bounding_box_are_clamped() {
        let grid = Grid::new(
            vec![
                (Point::new(0.0, 0.0, 0.0), 'a'),
                (Point::new(4.0, 4.0, 4.0), 'b'),
            ],
            1.5,
        );

        let hits = grid.within(&Point::new(-1.0, -1.0, -1.0), 2.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(*hits[0].1, 'a');

        let far = grid.within(&Point::new(50.0, 50.0, 50.0), 3.0);
        assert!(far.is_empty());
    }

    #[test]
    fn dense_cells_hold_every_item() {
        let items: Vec<(Point, usize)> = (0..20)
            .map(|i| (Point::new(0.01 * i as f64, 0.0, 0.0), i))
            .collect();
        let grid = Grid::new(items, 5.0);

        assert_eq!(grid.within(&Point::origin(), 1.0).len(), 20);
    }
}
