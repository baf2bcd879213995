//! Game persistence and the service that drives the engine against it.
//!
//! Every adapter serializes writes to one game: a read-modify-write on a
//! game id happens under the adapter's write lock, so concurrent moves on
//! the same game are applied one after another and never lost. Once a game
//! is won or lost, updates are dropped under that same lock and the stored
//! game is returned as it is.

use std::sync::Arc;

use sweeper_core::{Coord2, Game, GameId, Mutation, PointSet};

pub use error::*;
pub use hooks::*;
pub use memory::*;
pub use records::*;
pub use service::*;
pub use settings::*;

mod error;
mod hooks;
mod memory;
mod records;
mod service;
mod settings;

pub trait GameStore: Send + Sync {
    fn get(&self, id: GameId) -> StoreResult<Option<Game>>;

    /// Games that exist among `ids`, in the order given; unknown ids are skipped.
    fn get_many(&self, ids: &[GameId]) -> StoreResult<Vec<Game>> {
        let mut games = Vec::with_capacity(ids.len());
        for &id in ids {
            games.extend(self.get(id)?);
        }
        Ok(games)
    }

    /// Inserts a new game. For an existing id only the moves and flags are
    /// replaced; board, mines and creation time are immutable.
    fn save(&self, game: &Game) -> StoreResult<()>;

    fn add_moves(&self, id: GameId, points: &PointSet) -> StoreResult<Option<Game>>;

    fn add_flag(&self, id: GameId, point: Coord2) -> StoreResult<Option<Game>>;

    fn remove_flag(&self, id: GameId, point: Coord2) -> StoreResult<Option<Game>>;

    /// Applies an engine mutation; `None` when the game does not exist.
    fn apply(&self, id: GameId, mutation: &Mutation) -> StoreResult<Option<Game>> {
        match mutation {
            Mutation::None => self.get(id),
            Mutation::AddMoves(points) => self.add_moves(id, points),
            Mutation::AddFlag(point) => self.add_flag(id, *point),
            Mutation::RemoveFlag(point) => self.remove_flag(id, *point),
        }
    }
}

/// Which user a game belongs to.
pub trait OwnerStore: Send + Sync {
    fn add_mapping(&self, owner: &str, id: GameId) -> StoreResult<()>;

    fn game_ids_for_owner(&self, owner: &str) -> StoreResult<Vec<GameId>>;

    fn owner_of(&self, id: GameId) -> StoreResult<Option<String>>;
}

pub trait SweeperStore: GameStore + OwnerStore {}

impl<T: GameStore + OwnerStore> SweeperStore for T {}

/// Opens the backend named in the settings.
pub fn open_store(settings: &StoreSettings) -> StoreResult<Arc<dyn SweeperStore>> {
    Ok(match settings.backend {
        Backend::Memory => {
            log::info!("Using in-memory game store");
            Arc::new(MemoryStore::new())
        }
        Backend::Records => match &settings.data_dir {
            Some(dir) => {
                log::info!("Using record store in {}", dir.display());
                Arc::new(RecordStore::new(DirectoryRows::open(dir)?))
            }
            None => {
                log::info!("Using in-memory record store");
                Arc::new(RecordStore::new(MemoryRows::default()))
            }
        },
    })
}
