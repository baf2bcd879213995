use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Uniform placement by rejection sampling: draw any cell, retry on duplicates.
#[derive(Clone, Debug)]
pub struct RandomBoardGenerator<R = SmallRng> {
    rng: R,
}

impl RandomBoardGenerator<SmallRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_os_rng())
    }
}

impl<R: Rng> RandomBoardGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> BoardGenerator for RandomBoardGenerator<R> {
    fn generate(&mut self, config: GameConfig) -> Result<(Board, PointSet)> {
        config.validate()?;
        let (width, height) = config.size;

        let mut builder = BoardBuilder::new(config.size)?;
        let mut mine_points = PointSet::new();
        let mut draws: u64 = 0;
        while builder.placed() < config.mines {
            let coords = (
                self.rng.random_range(0..width),
                self.rng.random_range(0..height),
            );
            draws += 1;
            if builder.place_mine(coords) {
                mine_points.insert(coords);
            }
        }

        log::debug!(
            "Generated {}x{} board with {} mines after {} draws",
            width,
            height,
            config.mines,
            draws
        );
        Ok((builder.finish(), mine_points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_adjacency_invariant(board: &Board) {
        for x in 0..board.width() {
            for y in 0..board.height() {
                if let CellValue::Count(count) = board[(x, y)] {
                    let mines = board
                        .iter_neighbors((x, y))
                        .filter(|&pos| board[pos].is_mine())
                        .count();
                    assert_eq!(usize::from(count), mines, "cell ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn generates_exact_mine_count() {
        let config = GameConfig::new((16, 30), 99).unwrap();
        for seed in 0..20 {
            let (board, mines) = RandomBoardGenerator::from_seed(seed)
                .generate(config)
                .unwrap();
            assert_eq!(mines.len(), 99);
            assert_eq!(board.mine_count(), 99);
            assert_eq!(board.mine_points(), mines);
            assert_adjacency_invariant(&board);
        }
    }

    #[test]
    fn same_seed_same_board() {
        let config = GameConfig::new((9, 9), 10).unwrap();
        let a = RandomBoardGenerator::from_seed(7).generate(config).unwrap();
        let b = RandomBoardGenerator::from_seed(7).generate(config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn full_and_empty_boards() {
        let (full, mines) = RandomBoardGenerator::from_seed(1)
            .generate(GameConfig::new((4, 4), 16).unwrap())
            .unwrap();
        assert_eq!(mines.len(), 16);
        assert_eq!(full.safe_cell_count(), 0);
        assert!(full.iter_cells().all(CellValue::is_mine));

        let (empty, mines) = RandomBoardGenerator::from_seed(1)
            .generate(GameConfig::new((4, 4), 0).unwrap())
            .unwrap();
        assert!(mines.is_empty());
        assert!(empty.iter_cells().all(CellValue::is_zero));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = GameConfig::new_unchecked((3, 3), 10);
        assert_eq!(
            RandomBoardGenerator::from_seed(0).generate(config),
            Err(GameError::InvalidDimensions)
        );
        assert_eq!(generate(0, 3, 0), Err(GameError::InvalidDimensions));
    }
}
