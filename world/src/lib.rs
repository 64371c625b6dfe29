#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static walkability grid queried by the Stealth Nav planners and controllers.
//!
//! The grid is built once from a walkability mask and never mutated
//! afterwards. Every query takes `&self`, and no search state is stored on the
//! cells, so a single grid can be shared by any number of concurrent searches.

mod probe;
mod snapping;

use stealth_nav_core::{CellCoord, Vec2};

pub use probe::GridProbe;

/// Glyph marking a walkable cell in ASCII layouts.
pub const WALKABLE_GLYPH: char = '.';
/// Glyph marking a blocked cell in ASCII layouts.
pub const BLOCKED_GLYPH: char = '#';

/// Neighbor offsets: orthogonal first (N, E, S, W), then diagonals (NE, SE, SW, NW).
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Immutable cell of the walkability grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    coord: CellCoord,
    center: Vec2,
    walkable: bool,
}

impl Cell {
    /// Grid coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// World-space center of the cell.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Reports whether agents may stand in the cell.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }
}

/// Reasons a walkability grid could not be constructed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The grid has no columns or no rows.
    #[error("grid must contain at least one cell")]
    Empty,
    /// The cell size is zero, negative, or not finite.
    #[error("cell size {0} must be a positive finite number")]
    InvalidCellSize(f32),
    /// The walkability mask does not match the declared dimensions.
    #[error("walkability mask holds {actual} cells but the grid needs {expected}")]
    DimensionMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
    /// An ASCII layout row differs in width from the first row.
    #[error("layout row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// An ASCII layout contains a glyph other than `.` or `#`.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
}

/// Dense, read-only lattice of walkable and blocked cells.
///
/// `origin` is the world-space center of cell (0, 0). Cell (c, r) is centered
/// at `origin + (c, r) * cell_size` and covers half a cell in every direction,
/// with the upper edges belonging to the next cell. Rows grow along +y.
#[derive(Clone, Debug, PartialEq)]
pub struct WalkabilityGrid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: Vec2,
    cells: Vec<Cell>,
}

impl WalkabilityGrid {
    /// Builds a grid from a row-major walkability mask.
    pub fn from_walkability(
        columns: u32,
        rows: u32,
        cell_size: f32,
        origin: Vec2,
        walkable: Vec<bool>,
    ) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::Empty);
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridError::InvalidCellSize(cell_size));
        }

        let expected = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| GridError::Empty)?;
        if walkable.len() != expected {
            return Err(GridError::DimensionMismatch {
                expected,
                actual: walkable.len(),
            });
        }

        let mut cells = Vec::with_capacity(expected);
        let mut flags = walkable.into_iter();
        for row in 0..rows {
            for column in 0..columns {
                let coord = CellCoord::new(column, row);
                cells.push(Cell {
                    coord,
                    center: center_of(origin, cell_size, coord),
                    walkable: flags.next().unwrap_or(false),
                });
            }
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
            origin,
            cells,
        })
    }

    /// Builds a fully walkable grid whose cell (0, 0) is centered on the world origin.
    pub fn open(columns: u32, rows: u32, cell_size: f32) -> Result<Self, GridError> {
        let count = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| GridError::Empty)?;
        Self::from_walkability(columns, rows, cell_size, Vec2::ZERO, vec![true; count])
    }

    /// Parses an ASCII layout where `.` is walkable and `#` is blocked.
    ///
    /// The first non-blank line is row 0. Surrounding whitespace on each line is
    /// ignored.
    pub fn from_ascii(layout: &str, cell_size: f32, origin: Vec2) -> Result<Self, GridError> {
        let mut width: Option<usize> = None;
        let mut rows = 0usize;
        let mut walkable = Vec::new();

        for line in layout.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let mut count = 0usize;
            for (column, glyph) in line.chars().enumerate() {
                match glyph {
                    WALKABLE_GLYPH => walkable.push(true),
                    BLOCKED_GLYPH => walkable.push(false),
                    other => {
                        return Err(GridError::UnknownGlyph {
                            glyph: other,
                            row: rows,
                            column,
                        })
                    }
                }
                count += 1;
            }

            match width {
                None => width = Some(count),
                Some(expected) if expected != count => {
                    return Err(GridError::RaggedRow {
                        row: rows,
                        expected,
                        actual: count,
                    })
                }
                Some(_) => {}
            }
            rows += 1;
        }

        let columns = u32::try_from(width.unwrap_or(0)).map_err(|_| GridError::Empty)?;
        let rows = u32::try_from(rows).map_err(|_| GridError::Empty)?;
        Self::from_walkability(columns, rows, cell_size, origin, walkable)
    }

    /// Returns a copy of the grid with the provided cells marked as blocked.
    ///
    /// Intended for assembling layouts before the grid is shared; coordinates
    /// outside the grid are ignored.
    #[must_use]
    pub fn with_blocked_cells<I>(mut self, blocked: I) -> Self
    where
        I: IntoIterator<Item = CellCoord>,
    {
        for coord in blocked {
            if let Some(index) = self.index(coord) {
                self.cells[index].walkable = false;
            }
        }
        self
    }

    /// Renders the grid back into the ASCII layout accepted by [`Self::from_ascii`].
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let width = usize::try_from(self.columns).unwrap_or(0);
        let mut out = String::with_capacity(self.cells.len() + self.cells.len() / width.max(1));
        for row in self.cells.chunks(width.max(1)) {
            for cell in row {
                out.push(if cell.walkable {
                    WALKABLE_GLYPH
                } else {
                    BLOCKED_GLYPH
                });
            }
            out.push('\n');
        }
        out
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Edge length of a single square cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space center of cell (0, 0).
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Iterator over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Returns the cell stored at `coord`, if it lies within the grid.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.index(coord).and_then(|index| self.cells.get(index))
    }

    /// Returns the cell whose bounds contain `point`, if any.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<&Cell> {
        self.coord_at(point).and_then(|coord| self.cell(coord))
    }

    /// Converts a world-space position into the coordinate of the containing cell.
    #[must_use]
    pub fn coord_at(&self, point: Vec2) -> Option<CellCoord> {
        let local = (point - self.origin) / self.cell_size + Vec2::splat(0.5);
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let column = local.x.floor() as u32;
        let row = local.y.floor() as u32;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(CellCoord::new(column, row))
    }

    /// World-space center of `coord`, whether or not it lies within the grid.
    #[must_use]
    pub fn center_of(&self, coord: CellCoord) -> Vec2 {
        center_of(self.origin, self.cell_size, coord)
    }

    /// Reports whether `coord` lies within the grid and is walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.cell(coord).is_some_and(Cell::is_walkable)
    }

    /// Reports whether the cell containing `point` is walkable.
    #[must_use]
    pub fn is_walkable_at(&self, point: Vec2) -> bool {
        self.cell_at(point).is_some_and(Cell::is_walkable)
    }

    /// Enumerates the in-bounds cells adjacent to `coord`, walkable or not.
    ///
    /// Orthogonal neighbors are yielded before diagonal ones.
    pub fn neighbors(&self, coord: CellCoord) -> impl Iterator<Item = &Cell> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dc, dr)| coord.offset(dc, dr))
            .filter_map(move |neighbor| self.cell(neighbor))
    }

    /// Reports whether an agent may step from `from` into the adjacent cell `to`.
    ///
    /// Diagonal steps additionally require both orthogonally adjacent cells to
    /// be walkable unless `cut_corners` is set.
    #[must_use]
    pub fn can_step(&self, from: CellCoord, to: CellCoord, cut_corners: bool) -> bool {
        if !self.is_walkable(to) {
            return false;
        }

        let diagonal = from.column() != to.column() && from.row() != to.row();
        if !diagonal || cut_corners {
            return true;
        }

        self.is_walkable(CellCoord::new(to.column(), from.row()))
            && self.is_walkable(CellCoord::new(from.column(), to.row()))
    }

    /// Finds the walkable cell whose center is closest to `point` and no
    /// farther than `radius` from it.
    #[must_use]
    pub fn nearest_walkable(&self, point: Vec2, radius: f32) -> Option<&Cell> {
        snapping::nearest_walkable(self, point, radius)
    }

    /// Reports whether every cell crossed by the straight line between two
    /// world positions is walkable.
    ///
    /// Diagonal transitions also require both side cells to be walkable, so a
    /// walkable line never squeezes between two blocked corners.
    #[must_use]
    pub fn line_walkable(&self, from: Vec2, to: Vec2) -> bool {
        probe::line_walkable(self, from, to)
    }

    pub(crate) fn index(&self, coord: CellCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            let row = usize::try_from(coord.row()).ok()?;
            let column = usize::try_from(coord.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn center_of(origin: Vec2, cell_size: f32, coord: CellCoord) -> Vec2 {
    origin + Vec2::new(coord.column() as f32, coord.row() as f32) * cell_size
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "
        .....
        .###.
        .....
    ";

    #[test]
    fn cell_at_maps_bounds_around_centers() {
        let grid = WalkabilityGrid::open(4, 3, 2.0).expect("grid");

        assert_eq!(grid.coord_at(Vec2::new(0.0, 0.0)), Some(CellCoord::new(0, 0)));
        assert_eq!(grid.coord_at(Vec2::new(-0.99, 0.99)), Some(CellCoord::new(0, 0)));
        assert_eq!(grid.coord_at(Vec2::new(1.0, 0.0)), Some(CellCoord::new(1, 0)));
        assert_eq!(grid.coord_at(Vec2::new(6.9, 4.9)), Some(CellCoord::new(3, 2)));
        assert_eq!(grid.coord_at(Vec2::new(-1.01, 0.0)), None);
        assert_eq!(grid.coord_at(Vec2::new(7.0, 0.0)), None);
        assert_eq!(grid.coord_at(Vec2::new(f32::NAN, 0.0)), None);

        let cell = grid.cell_at(Vec2::new(4.2, 1.8)).expect("cell in bounds");
        assert_eq!(cell.coord(), CellCoord::new(2, 1));
        assert_eq!(cell.center(), Vec2::new(4.0, 2.0));
    }

    #[test]
    fn neighbors_exclude_out_of_bounds_cells() {
        let grid = WalkabilityGrid::open(3, 3, 1.0).expect("grid");

        assert_eq!(grid.neighbors(CellCoord::new(1, 1)).count(), 8);
        assert_eq!(grid.neighbors(CellCoord::new(0, 0)).count(), 3);
        assert_eq!(grid.neighbors(CellCoord::new(1, 0)).count(), 5);

        let order: Vec<_> = grid
            .neighbors(CellCoord::new(1, 1))
            .take(4)
            .map(Cell::coord)
            .collect();
        assert_eq!(
            order,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 1),
                CellCoord::new(1, 2),
                CellCoord::new(0, 1),
            ]
        );
    }

    #[test]
    fn neighbors_include_blocked_cells() {
        let grid = WalkabilityGrid::from_ascii(ROOM, 1.0, Vec2::ZERO).expect("grid");
        let blocked = grid
            .neighbors(CellCoord::new(0, 0))
            .filter(|cell| !cell.is_walkable())
            .count();
        assert_eq!(blocked, 1);
    }

    #[test]
    fn from_ascii_parses_layout_rows() {
        let grid = WalkabilityGrid::from_ascii(ROOM, 1.0, Vec2::ZERO).expect("grid");

        assert_eq!(grid.dimensions(), (5, 3));
        assert!(grid.is_walkable(CellCoord::new(0, 1)));
        assert!(!grid.is_walkable(CellCoord::new(2, 1)));
        assert!(!grid.is_walkable(CellCoord::new(9, 9)));
        assert_eq!(grid.to_ascii(), ".....\n.###.\n.....\n");
    }

    #[test]
    fn from_ascii_rejects_malformed_layouts() {
        assert_eq!(
            WalkabilityGrid::from_ascii("..\n...", 1.0, Vec2::ZERO),
            Err(GridError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 3,
            })
        );
        assert_eq!(
            WalkabilityGrid::from_ascii(".x", 1.0, Vec2::ZERO),
            Err(GridError::UnknownGlyph {
                glyph: 'x',
                row: 0,
                column: 1,
            })
        );
        assert_eq!(
            WalkabilityGrid::from_ascii("  \n", 1.0, Vec2::ZERO),
            Err(GridError::Empty)
        );
        assert_eq!(
            WalkabilityGrid::open(2, 2, 0.0),
            Err(GridError::InvalidCellSize(0.0))
        );
        assert_eq!(
            WalkabilityGrid::from_walkability(2, 2, 1.0, Vec2::ZERO, vec![true; 3]),
            Err(GridError::DimensionMismatch {
                expected: 4,
                actual: 3,
            })
        );
    }

    #[test]
    fn can_step_refuses_to_cut_blocked_corners() {
        let grid = WalkabilityGrid::from_ascii(
            "
            .#
            ..
            ",
            1.0,
            Vec2::ZERO,
        )
        .expect("grid");

        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(1, 1);
        assert!(!grid.can_step(from, to, false));
        assert!(grid.can_step(from, to, true));
        assert!(grid.can_step(from, CellCoord::new(0, 1), false));
        assert!(!grid.can_step(from, CellCoord::new(1, 0), true));
    }

    #[test]
    fn with_blocked_cells_ignores_out_of_bounds() {
        let grid = WalkabilityGrid::open(2, 2, 1.0)
            .expect("grid")
            .with_blocked_cells([CellCoord::new(1, 1), CellCoord::new(5, 5)]);
        assert_eq!(grid.cells().filter(|cell| cell.is_walkable()).count(), 3);
    }

    #[test]
    fn grid_can_be_shared_across_threads() {
        fn assert_shareable<T: Send + Sync>() {}
        assert_shareable::<WalkabilityGrid>();
        assert_shareable::<GridProbe<'static>>();
    }
}
