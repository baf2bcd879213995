#![no_std]

extern crate alloc;

use alloc::collections::BTreeSet;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use codec::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use reveal::*;
pub use tile::*;
pub use types::*;
pub use view::*;

mod codec;
mod engine;
mod error;
mod generator;
mod reveal;
mod tile;
mod types;
mod view;

/// Set of board positions, ordered by `(x, y)`.
pub type PointSet = BTreeSet<Coord2>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Checks that both sides are non-zero and the mines fit on the board.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from wire-sized integers, rejecting anything that does
    /// not fit the board coordinate types.
    pub fn from_dimensions(width: i64, height: i64, mines: i64) -> Result<Self> {
        let width = Coord::try_from(width).map_err(|_| GameError::InvalidDimensions)?;
        let height = Coord::try_from(height).map_err(|_| GameError::InvalidDimensions)?;
        let mines = CellCount::try_from(mines).map_err(|_| GameError::InvalidDimensions)?;
        Self::new((width, height), mines)
    }

    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.size;
        if width == 0 || height == 0 || self.mines > self.total_cells() {
            Err(GameError::InvalidDimensions)
        } else {
            Ok(())
        }
    }

    pub const fn width(&self) -> Coord {
        self.size.0
    }

    pub const fn height(&self) -> Coord {
        self.size.1
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mines
    }
}

/// Dense grid of cell values indexed `[x, y]`.
///
/// Every non-mine cell holds the number of mines in its Moore neighborhood.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Array2<CellValue>", into = "Array2<CellValue>")]
pub struct Board {
    cells: Array2<CellValue>,
    mine_count: CellCount,
}

impl Board {
    /// Builds a board with mines exactly at `mine_coords`; duplicates collapse.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut builder = BoardBuilder::new(size)?;
        for &coords in mine_coords {
            builder.validate_coords(coords)?;
            builder.place_mine(coords);
        }
        Ok(builder.finish())
    }

    /// Adopts an already computed grid, checking the adjacency invariant.
    pub fn from_cells(cells: Array2<CellValue>) -> Result<Self> {
        let (size_x, size_y) = cells.dim();
        if size_x == 0 || size_y == 0 || size_x > Coord::MAX.into() || size_y > Coord::MAX.into()
        {
            return Err(GameError::InvalidDimensions);
        }

        let mut mine_count: CellCount = 0;
        for ((x, y), &value) in cells.indexed_iter() {
            let coords = (x as Coord, y as Coord);
            match value {
                CellValue::Mine => mine_count += 1,
                CellValue::Count(count) => {
                    let adjacent = cells
                        .iter_neighbors(coords)
                        .filter(|&pos| cells[pos.to_nd_index()].is_mine())
                        .count();
                    if usize::from(count) != adjacent {
                        log::warn!(
                            "Cell {:?} claims {} adjacent mines, actual {}",
                            coords,
                            count,
                            adjacent
                        );
                        return Err(GameError::InvalidState);
                    }
                }
            }
        }

        Ok(Self { cells, mine_count })
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn size(&self) -> Coord2 {
        let (size_x, size_y) = self.cells.dim();
        (size_x as Coord, size_y as Coord)
    }

    pub fn width(&self) -> Coord {
        self.size().0
    }

    pub fn height(&self) -> Coord {
        self.size().1
    }

    pub fn total_cells(&self) -> CellCount {
        self.game_config().total_cells()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        let size = self.size();
        coords.0 < size.0 && coords.1 < size.1
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn mine_points(&self) -> PointSet {
        self.cells
            .indexed_iter()
            .filter(|(_, value)| value.is_mine())
            .map(|((x, y), _)| (x as Coord, y as Coord))
            .collect()
    }

    /// Cells in `x * height + y` order.
    pub fn iter_cells(&self) -> impl Iterator<Item = CellValue> + '_ {
        self.cells.iter().copied()
    }

    pub fn cells(&self) -> &Array2<CellValue> {
        &self.cells
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}

impl TryFrom<Array2<CellValue>> for Board {
    type Error = GameError;

    fn try_from(cells: Array2<CellValue>) -> Result<Self> {
        Self::from_cells(cells)
    }
}

impl From<Board> for Array2<CellValue> {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl Index<Coord2> for Board {
    type Output = CellValue;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

/// Accumulates mines one at a time, bumping neighbor counters as it goes.
#[derive(Debug)]
pub(crate) struct BoardBuilder {
    counts: Array2<u8>,
    mines: Array2<bool>,
    placed: CellCount,
}

impl BoardBuilder {
    pub(crate) fn new(size: Coord2) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }
        Ok(Self {
            counts: Array2::zeros(size.to_nd_index()),
            mines: Array2::default(size.to_nd_index()),
            placed: 0,
        })
    }

    fn validate_coords(&self, coords: Coord2) -> Result<()> {
        let (size_x, size_y) = self.counts.dim();
        if usize::from(coords.0) < size_x && usize::from(coords.1) < size_y {
            Ok(())
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub(crate) fn placed(&self) -> CellCount {
        self.placed
    }

    /// Returns `false` when a mine is already there.
    pub(crate) fn place_mine(&mut self, coords: Coord2) -> bool {
        let index = coords.to_nd_index();
        if self.mines[index] {
            return false;
        }
        self.mines[index] = true;
        self.placed += 1;
        for pos in self.counts.iter_neighbors(coords) {
            self.counts[pos.to_nd_index()] += 1;
        }
        true
    }

    /// Mine cells are stamped over whatever their neighbors added to them.
    pub(crate) fn finish(self) -> Board {
        let cells = ndarray::Zip::from(&self.counts)
            .and(&self.mines)
            .map_collect(|&count, &is_mine| {
                if is_mine {
                    CellValue::Mine
                } else {
                    CellValue::Count(count)
                }
            });
        Board {
            cells,
            mine_count: self.placed,
        }
    }
}
