//! JSON shapes exchanged with clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sweeper_core::{Coord, Coord2, Game, GameConfig, GameError, GameStatus, GameView};

/// Wire coordinate of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    /// Narrows to board coordinates; anything negative or too large can only
    /// be outside the board.
    pub fn to_coords(self) -> Result<Coord2, GameError> {
        let x = Coord::try_from(self.x).map_err(|_| GameError::OutOfBounds)?;
        let y = Coord::try_from(self.y).map_err(|_| GameError::OutOfBounds)?;
        Ok((x, y))
    }
}

impl From<Coord2> for Point {
    fn from((x, y): Coord2) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub x: i64,
    pub y: i64,
    #[serde(rename = "gameId", default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<i32>,
}

impl MoveRequest {
    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    pub fn coords(&self) -> Result<Coord2, GameError> {
        self.point().to_coords()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameRequest {
    pub width: i64,
    pub height: i64,
    pub mines: i64,
}

impl NewGameRequest {
    pub fn config(&self) -> Result<GameConfig, GameError> {
        GameConfig::from_dimensions(self.width, self.height, self.mines)
    }
}

impl From<GameConfig> for NewGameRequest {
    fn from(config: GameConfig) -> Self {
        Self {
            width: config.width().into(),
            height: config.height().into(),
            mines: config.mines.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusDto {
    InProgress,
    Won,
    Lost,
}

impl From<GameStatus> for StatusDto {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::Active => Self::InProgress,
            GameStatus::Won => Self::Won,
            GameStatus::Lost => Self::Lost,
        }
    }
}

/// Client snapshot of a game. `board[x][y]` holds `-1` unknown, `-2` mine,
/// `-3` flag, or the adjacent mine count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: i32,
    pub board: Vec<Vec<i8>>,
    pub mine_count: usize,
    pub flag_points: Vec<Point>,
    pub status: StatusDto,
    pub created_at: DateTime<Utc>,
}

impl From<&GameView> for GameSnapshot {
    fn from(view: &GameView) -> Self {
        let board = view
            .board
            .outer_iter()
            .map(|column| column.iter().map(|cell| cell.to_byte()).collect())
            .collect();

        Self {
            id: view.id.0,
            board,
            mine_count: view.mine_count.into(),
            flag_points: view.flag_points.iter().copied().map(Point::from).collect(),
            status: view.status.into(),
            created_at: view.created_at,
        }
    }
}

impl From<&Game> for GameSnapshot {
    fn from(game: &Game) -> Self {
        Self::from(&GameView::from_game(game))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub won: u32,
    pub lost: u32,
    pub in_progress: u32,
}

impl GameStats {
    pub fn record(&mut self, status: GameStatus) {
        match status {
            GameStatus::Active => self.in_progress += 1,
            GameStatus::Won => self.won += 1,
            GameStatus::Lost => self.lost += 1,
        }
    }
}

impl<'a> FromIterator<&'a Game> for GameStats {
    fn from_iter<I: IntoIterator<Item = &'a Game>>(games: I) -> Self {
        let mut stats = Self::default();
        for game in games {
            stats.record(game.status());
        }
        stats
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
