use std::collections::HashMap;
use std::sync::RwLock;

use sweeper_core::{Coord2, Game, GameId, PointSet};

use crate::*;

/// Keeps decoded games in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: RwLock<HashMap<GameId, Game>>,
    owners: RwLock<HashMap<GameId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, id: GameId, f: F) -> StoreResult<Option<Game>>
    where
        F: FnOnce(&mut Game) -> sweeper_core::Result<()>,
    {
        let mut games = self.games.write()?;
        let Some(game) = games.get_mut(&id) else {
            return Ok(None);
        };

        // Commit only if the whole update succeeds.
        let mut updated = game.clone();
        f(&mut updated)?;
        *game = updated.clone();
        Ok(Some(updated))
    }
}

impl GameStore for MemoryStore {
    fn get(&self, id: GameId) -> StoreResult<Option<Game>> {
        Ok(self.games.read()?.get(&id).cloned())
    }

    fn save(&self, game: &Game) -> StoreResult<()> {
        let mut games = self.games.write()?;
        match games.get_mut(&game.id()) {
            Some(existing) => {
                *existing = Game::from_parts(
                    existing.id(),
                    existing.board().clone(),
                    existing.mine_points().clone(),
                    game.moves().clone(),
                    game.flag_points().clone(),
                    existing.created_at(),
                )?;
            }
            None => {
                games.insert(game.id(), game.clone());
            }
        }
        Ok(())
    }

    fn add_moves(&self, id: GameId, points: &PointSet) -> StoreResult<Option<Game>> {
        self.update(id, |game| game.add_moves(points))
    }

    fn add_flag(&self, id: GameId, point: Coord2) -> StoreResult<Option<Game>> {
        self.update(id, |game| game.add_flag(point))
    }

    fn remove_flag(&self, id: GameId, point: Coord2) -> StoreResult<Option<Game>> {
        self.update(id, |game| game.remove_flag(point))
    }
}

impl OwnerStore for MemoryStore {
    fn add_mapping(&self, owner: &str, id: GameId) -> StoreResult<()> {
        self.owners.write()?.insert(id, owner.to_owned());
        Ok(())
    }

    fn game_ids_for_owner(&self, owner: &str) -> StoreResult<Vec<GameId>> {
        let mut ids: Vec<GameId> = self
            .owners
            .read()?
            .iter()
            .filter(|(_, game_owner)| game_owner.as_str() == owner)
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn owner_of(&self, id: GameId) -> StoreResult<Option<String>> {
        Ok(self.owners.read()?.get(&id).cloned())
    }
}
