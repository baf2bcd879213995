use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sweeper_core::{
    BoardGenerator, Coord2, Game, GameAction, GameConfig, GameId, GameStatus,
    RandomBoardGenerator,
};
use sweeper_protocol::GameStats;

use crate::*;

/// Drives the engine against a store: load, plan, apply, return the result.
pub struct GameService {
    store: Arc<dyn SweeperStore>,
    limits: Limits,
    rng: Mutex<SmallRng>,
}

impl GameService {
    pub fn new(store: Arc<dyn SweeperStore>, limits: Limits) -> Self {
        Self::with_rng(store, limits, SmallRng::from_os_rng())
    }

    /// Reproducible ids and boards, for tests and replays.
    pub fn with_seed(store: Arc<dyn SweeperStore>, limits: Limits, seed: u64) -> Self {
        Self::with_rng(store, limits, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<dyn SweeperStore>, limits: Limits, rng: SmallRng) -> Self {
        Self {
            store,
            limits,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &dyn SweeperStore {
        &*self.store
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Hook that makes `owner` the owner of the game it is run for.
    pub fn associate_owner(&self, owner: impl Into<String>) -> AssociateOwner<'_> {
        AssociateOwner::new(&*self.store, owner)
    }

    pub fn new_game(&self, config: GameConfig) -> ServiceResult<Game> {
        config.validate()?;
        self.limits.check(&config)?;

        let game = {
            let mut rng = self.rng.lock().map_err(StoreError::from)?;
            let id = loop {
                let id = GameId::random(&mut *rng);
                if self.store.get(id)?.is_none() {
                    break id;
                }
            };
            let (board, mine_points) = RandomBoardGenerator::new(&mut *rng).generate(config)?;
            Game::new(id, board, mine_points, Utc::now())?
        };
        self.store.save(&game)?;

        log::info!(
            "Created game {} ({}x{}, {} mines)",
            game.id(),
            config.width(),
            config.height(),
            config.mines
        );
        Ok(game)
    }

    pub fn get_game(&self, id: GameId) -> ServiceResult<Game> {
        if id.0 == 0 {
            return Err(ServiceError::MissingId);
        }
        self.store.get(id)?.ok_or(ServiceError::NotFound(id))
    }

    pub fn make_move(&self, id: GameId, coords: Coord2, user: Option<&str>) -> ServiceResult<Game> {
        self.play(id, GameAction::Reveal, coords, user)
    }

    pub fn toggle_flag(
        &self,
        id: GameId,
        coords: Coord2,
        user: Option<&str>,
    ) -> ServiceResult<Game> {
        self.play(id, GameAction::ToggleFlag, coords, user)
    }

    /// Plans `action` on the stored game and hands the resulting mutation
    /// to the store. No-op moves return the game as loaded.
    pub fn play(
        &self,
        id: GameId,
        action: GameAction,
        coords: Coord2,
        user: Option<&str>,
    ) -> ServiceResult<Game> {
        self.check_ownership(id, user)?;
        let game = self.get_game(id)?;

        let mutation = game.plan(action, coords)?;
        if !mutation.has_update() {
            log::debug!("Game {id}: {action:?} at {coords:?} changes nothing");
            return Ok(game);
        }

        let updated = self
            .store
            .apply(id, &mutation)?
            .ok_or(ServiceError::NotFound(id))?;

        log::debug!("Game {id}: {action:?} at {coords:?}");
        if updated.status() != game.status() {
            match updated.status() {
                GameStatus::Won => log::info!("Game {id} won"),
                GameStatus::Lost => log::info!("Game {id} lost at {coords:?}"),
                GameStatus::Active => {}
            }
        }
        Ok(updated)
    }

    pub fn owner_games(&self, owner: &str) -> ServiceResult<Vec<Game>> {
        let ids = self.store.game_ids_for_owner(owner)?;
        Ok(self.store.get_many(&ids)?)
    }

    pub fn owner_stats(&self, owner: &str) -> ServiceResult<GameStats> {
        Ok(self.owner_games(owner)?.iter().collect())
    }

    /// Owned games only accept moves from their owner; unowned games from anyone.
    fn check_ownership(&self, id: GameId, user: Option<&str>) -> ServiceResult<()> {
        let owner = self.store.owner_of(id)?;
        log::debug!("Checking ownership of game {id}: owner={owner:?}, user={user:?}");

        match (owner, user) {
            (Some(owner), Some(user)) if owner != user => {
                log::warn!("Game {id} belongs to {owner}, rejected move by {user}");
                Err(ServiceError::Unauthorized)
            }
            (Some(_), None) => {
                log::warn!("Game {id} has an owner, rejected anonymous move");
                Err(ServiceError::Unauthorized)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> GameService {
        GameService::with_seed(Arc::new(MemoryStore::new()), Limits::default(), 17)
    }

    #[test]
    fn new_game_is_saved_and_active() {
        let service = service();

        let game = service
            .new_game(GameConfig::new((9, 9), 10).unwrap())
            .unwrap();

        assert!(game.id().0 >= 1);
        assert_eq!(game.status(), GameStatus::Active);
        assert_eq!(game.mine_points().len(), 10);
        assert_eq!(service.get_game(game.id()).unwrap(), game);
        assert_eq!(game.created_at().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn new_game_respects_limits() {
        let limits = Limits {
            max_width: 8,
            max_height: 8,
        };
        let service = GameService::with_seed(Arc::new(MemoryStore::new()), limits, 1);

        assert!(matches!(
            service.new_game(GameConfig::new_unchecked((9, 9), 10)),
            Err(ServiceError::TooLarge { .. })
        ));
        assert!(matches!(
            service.new_game(GameConfig::new_unchecked((4, 4), 17)),
            Err(ServiceError::Game(sweeper_core::GameError::InvalidDimensions))
        ));
    }

    #[test]
    fn missing_and_unknown_ids() {
        let service = service();
        assert!(matches!(
            service.get_game(GameId(0)),
            Err(ServiceError::MissingId)
        ));
        assert!(matches!(
            service.make_move(GameId(5), (0, 0), None),
            Err(ServiceError::NotFound(GameId(5)))
        ));
    }
}
