use ndarray::Array2;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Position of `coords` in the flat `x * height + y` ordering shared by the
/// board bytes and the bitmasks.
pub const fn flat_index((x, y): Coord2, height: Coord) -> usize {
    x as usize * height as usize + y as usize
}

/// Inverse of [`flat_index`].
pub const fn coords_at(index: usize, height: Coord) -> Coord2 {
    let height = height as usize;
    ((index / height) as Coord, (index % height) as Coord)
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let (size_x, size_y) = self.dim();
        let size = (
            Coord::try_from(size_x).unwrap_or(Coord::MAX),
            Coord::try_from(size_y).unwrap_or(Coord::MAX),
        );
        NeighborIter::new(index, size)
    }
}

const MOORE_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Shifts `coords` by `offset`, keeping only results inside `bounds`.
fn offset_within((x, y): Coord2, (dx, dy): (i8, i8), (max_x, max_y): Coord2) -> Option<Coord2> {
    let next_x = x.checked_add_signed(dx)?;
    let next_y = y.checked_add_signed(dy)?;
    (next_x < max_x && next_y < max_y).then_some((next_x, next_y))
}

/// Iterates the in-bounds Moore neighborhood (up to 8 cells) of a center cell.
#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    next_offset: usize,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            next_offset: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&offset) = MOORE_OFFSETS.get(self.next_offset) {
            self.next_offset += 1;
            if let Some(coords) = offset_within(self.center, offset, self.bounds) {
                return Some(coords);
            }
        }
        None
    }
}
