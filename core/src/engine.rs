use chrono::{DateTime, SubsecRound, Utc};
use core::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Store key of a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i32);

impl GameId {
    /// Draws an id from `1..i32::MAX`; zero is never handed out.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self(rng.random_range(1..i32::MAX))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Active,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    Reveal,
    ToggleFlag,
}

/// Change a move makes to a game, in the shape a store applies atomically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    None,
    AddMoves(PointSet),
    AddFlag(Coord2),
    RemoveFlag(Coord2),
}

impl Mutation {
    pub const fn has_update(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Result of a flag toggle on a local game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

/// Result of a reveal on a local game, named after the status it leaves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

/// One game: the board, its mines, and what the player has done to it.
///
/// Moves and flags never overlap. Moves only contain mines once the game is
/// lost, and then contain all of them.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    id: GameId,
    board: Board,
    mine_points: PointSet,
    moves: PointSet,
    flag_points: PointSet,
    created_at: DateTime<Utc>,
    status: GameStatus,
}

impl Game {
    /// Starts a fresh game on a generated board.
    pub fn new(
        id: GameId,
        board: Board,
        mine_points: PointSet,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        Self::from_parts(
            id,
            board,
            mine_points,
            PointSet::new(),
            PointSet::new(),
            created_at,
        )
    }

    /// Reassembles a game, checking every cross-field invariant.
    ///
    /// `created_at` is kept to the microsecond, the precision of a stored record.
    pub fn from_parts(
        id: GameId,
        board: Board,
        mine_points: PointSet,
        moves: PointSet,
        flag_points: PointSet,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut game = Self {
            id,
            board,
            mine_points,
            moves,
            flag_points,
            created_at: created_at.trunc_subsecs(6),
            status: GameStatus::Active,
        };
        game.check_consistency()?;
        game.refresh_status();
        Ok(game)
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mine_points(&self) -> &PointSet {
        &self.mine_points
    }

    pub fn moves(&self) -> &PointSet {
        &self.moves
    }

    pub fn flag_points(&self) -> &PointSet {
        &self.flag_points
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn mines_left(&self) -> isize {
        (self.mine_points.len() as isize) - (self.flag_points.len() as isize)
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.moves.contains(&coords)
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.flag_points.contains(&coords)
    }

    /// Works out what `action` at `coords` would change without changing it.
    pub fn plan(&self, action: GameAction, coords: Coord2) -> Result<Mutation> {
        let coords = self.board.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(Mutation::None);
        }

        match action {
            GameAction::Reveal => self.plan_reveal(coords),
            GameAction::ToggleFlag => Ok(self.plan_toggle_flag(coords)),
        }
    }

    fn plan_reveal(&self, coords: Coord2) -> Result<Mutation> {
        if self.is_revealed(coords) || self.is_flagged(coords) {
            return Ok(Mutation::None);
        }

        let points = match self.board[coords] {
            CellValue::Mine => self.mine_points.clone(),
            CellValue::Count(0) => zero_flood_fill(&self.board, coords)?,
            CellValue::Count(_) => PointSet::from([coords]),
        };
        Ok(Mutation::AddMoves(points))
    }

    fn plan_toggle_flag(&self, coords: Coord2) -> Mutation {
        if self.is_revealed(coords) {
            Mutation::None
        } else if self.is_flagged(coords) {
            Mutation::RemoveFlag(coords)
        } else {
            Mutation::AddFlag(coords)
        }
    }

    /// Applies a mutation as a whole.
    ///
    /// Points are bounds-checked before anything is touched. A finished game
    /// stays as it is, so a mutation planned before the game ended is dropped.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::None => Ok(()),
            Mutation::AddMoves(points) => self.add_moves(points),
            Mutation::AddFlag(coords) => self.add_flag(*coords),
            Mutation::RemoveFlag(coords) => self.remove_flag(*coords),
        }
    }

    /// Marks `points` revealed. Revealed cells lose their flags.
    pub fn add_moves(&mut self, points: &PointSet) -> Result<()> {
        for &coords in points {
            self.board.validate_coords(coords)?;
        }
        if self.is_finished() {
            return Ok(());
        }
        for &coords in points {
            self.flag_points.remove(&coords);
            self.moves.insert(coords);
        }
        self.refresh_status();
        Ok(())
    }

    /// Flags an unrevealed cell; flagging a revealed cell does nothing.
    pub fn add_flag(&mut self, coords: Coord2) -> Result<()> {
        let coords = self.board.validate_coords(coords)?;
        if !self.is_finished() && !self.is_revealed(coords) {
            self.flag_points.insert(coords);
        }
        Ok(())
    }

    pub fn remove_flag(&mut self, coords: Coord2) -> Result<()> {
        let coords = self.board.validate_coords(coords)?;
        if !self.is_finished() {
            self.flag_points.remove(&coords);
        }
        Ok(())
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let mutation = self.plan(GameAction::Reveal, coords)?;
        self.apply(&mutation)?;
        Ok(self.reveal_outcome(&mutation))
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let mutation = self.plan(GameAction::ToggleFlag, coords)?;
        self.apply(&mutation)?;
        Ok(if mutation.has_update() {
            MarkOutcome::Changed
        } else {
            MarkOutcome::NoChange
        })
    }

    /// Classifies the current state as the result of having applied `mutation`.
    pub fn reveal_outcome(&self, mutation: &Mutation) -> RevealOutcome {
        if !mutation.has_update() {
            return RevealOutcome::NoChange;
        }
        match self.status {
            GameStatus::Active => RevealOutcome::Revealed,
            GameStatus::Won => RevealOutcome::Won,
            GameStatus::Lost => RevealOutcome::HitMine,
        }
    }

    fn refresh_status(&mut self) {
        self.status = if self.mine_points.iter().any(|p| self.moves.contains(p)) {
            GameStatus::Lost
        } else if self.moves.len() == usize::from(self.board.safe_cell_count()) {
            GameStatus::Won
        } else {
            GameStatus::Active
        };
    }

    fn check_consistency(&self) -> Result<()> {
        if self.mine_points != self.board.mine_points() {
            log::warn!("Game {}: mine set disagrees with board", self.id);
            return Err(GameError::InvalidState);
        }

        let in_bounds = |points: &PointSet| points.iter().all(|&p| self.board.contains(p));
        if !in_bounds(&self.moves) || !in_bounds(&self.flag_points) {
            return Err(GameError::InvalidState);
        }

        if !self.moves.is_disjoint(&self.flag_points) {
            log::warn!("Game {}: flagged cells are also revealed", self.id);
            return Err(GameError::InvalidState);
        }

        let hit_mine = !self.moves.is_disjoint(&self.mine_points);
        if hit_mine && !self.moves.is_superset(&self.mine_points) {
            log::warn!("Game {}: lost game without all mines revealed", self.id);
            return Err(GameError::InvalidState);
        }

        Ok(())
    }
}
