use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// What a player may see of a game: unrevealed cells are masked and mine
/// positions only show up once they have been revealed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub id: GameId,
    pub size: Coord2,
    pub board: Array2<ViewCell>,
    pub mine_count: CellCount,
    pub flag_points: PointSet,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
}

impl GameView {
    pub fn from_game(game: &Game) -> Self {
        let size = game.size();
        let mut board = Array2::from_elem(size.to_nd_index(), ViewCell::Unknown);

        for &coords in game.flag_points() {
            board[coords.to_nd_index()] = ViewCell::Flag;
        }
        for &coords in game.moves() {
            board[coords.to_nd_index()] = ViewCell::Revealed(game.board()[coords]);
        }

        Self {
            id: game.id(),
            size,
            board,
            mine_count: game.mine_points().len() as CellCount,
            flag_points: game.flag_points().clone(),
            status: game.status(),
            created_at: game.created_at(),
        }
    }

    pub fn cell_at(&self, coords: Coord2) -> ViewCell {
        self.board[coords.to_nd_index()]
    }
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self::from_game(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(size: Coord2, mines: &[Coord2]) -> Game {
        let board = Board::from_mine_coords(size, mines).unwrap();
        let mine_points = board.mine_points();
        let created_at = DateTime::from_timestamp(0, 0).unwrap();
        Game::new(GameId(5), board, mine_points, created_at).unwrap()
    }

    #[test]
    fn fresh_game_is_fully_masked() {
        let view = GameView::from_game(&game((3, 2), &[(0, 0)]));

        assert_eq!(view.size, (3, 2));
        assert_eq!(view.mine_count, 1);
        assert!(view.board.iter().all(|&cell| cell == ViewCell::Unknown));
    }

    #[test]
    fn shows_moves_and_flags_but_not_mines() {
        let mut game = game((3, 3), &[(0, 0), (2, 2)]);
        game.reveal((1, 1)).unwrap();
        game.toggle_flag((0, 0)).unwrap();

        let view = GameView::from(&game);

        assert_eq!(view.cell_at((1, 1)), ViewCell::Revealed(CellValue::Count(2)));
        assert_eq!(view.cell_at((0, 0)), ViewCell::Flag);
        assert_eq!(view.cell_at((2, 2)), ViewCell::Unknown);
        assert_eq!(view.flag_points, PointSet::from([(0, 0)]));
        assert_eq!(view.status, GameStatus::Active);
    }

    #[test]
    fn lost_game_reveals_every_mine() {
        let mut game = game((3, 3), &[(0, 0), (2, 2)]);
        game.toggle_flag((0, 0)).unwrap();
        game.reveal((2, 2)).unwrap();

        let view = GameView::from_game(&game);

        assert_eq!(view.status, GameStatus::Lost);
        assert_eq!(view.cell_at((0, 0)), ViewCell::Revealed(CellValue::Mine));
        assert_eq!(view.cell_at((2, 2)), ViewCell::Revealed(CellValue::Mine));
        assert_eq!(view.cell_at((1, 0)), ViewCell::Unknown);
    }
}
