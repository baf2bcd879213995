use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    /// Lays out `config.mines` mines and returns the board with its mine set.
    fn generate(&mut self, config: GameConfig) -> Result<(Board, PointSet)>;
}

/// Generates a board with fresh randomness.
pub fn generate(width: Coord, height: Coord, mines: CellCount) -> Result<(Board, PointSet)> {
    let config = GameConfig::new((width, height), mines)?;
    RandomBoardGenerator::from_entropy().generate(config)
}
