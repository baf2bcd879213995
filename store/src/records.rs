use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use sweeper_core::{CodecError, Coord2, Game, GameId, GameRecord, PointSet};
use tempfile::Builder;

use crate::*;

/// Raw row storage for encoded game records, keyed by game id.
pub trait RowBackend: Send + Sync {
    fn load(&self, id: GameId) -> StoreResult<Option<Vec<u8>>>;

    fn store(&self, id: GameId, row: &[u8]) -> StoreResult<()>;

    fn load_owner(&self, id: GameId) -> StoreResult<Option<String>>;

    fn store_owner(&self, id: GameId, owner: &str) -> StoreResult<()>;

    fn owned_ids(&self, owner: &str) -> StoreResult<Vec<GameId>>;
}

/// Persists games in the fixed binary record layout and updates the
/// moves/flags bitmasks in place.
#[derive(Debug)]
pub struct RecordStore<B> {
    rows: B,
    write_lock: Mutex<()>,
}

impl<B: RowBackend> RecordStore<B> {
    pub fn new(rows: B) -> Self {
        Self {
            rows,
            write_lock: Mutex::new(()),
        }
    }

    pub fn rows(&self) -> &B {
        &self.rows
    }

    fn load_record(&self, id: GameId) -> StoreResult<Option<GameRecord>> {
        self.rows
            .load(id)?
            .map(|row| GameRecord::from_bytes(&row).map_err(|source| corrupt(id, source)))
            .transpose()
    }

    fn update<F>(&self, id: GameId, f: F) -> StoreResult<Option<Game>>
    where
        F: FnOnce(&mut GameRecord) -> Result<(), CodecError>,
    {
        let _guard = self.write_lock.lock()?;
        let Some(mut record) = self.load_record(id)? else {
            return Ok(None);
        };
        let current = record.decode(id).map_err(|source| corrupt(id, source))?;

        f(&mut record).map_err(|err| match err {
            CodecError::Game(err) => StoreError::Game(err),
            other => corrupt(id, other),
        })?;
        if current.is_finished() {
            log::debug!("Game {id} is {:?}, update dropped", current.status());
            return Ok(Some(current));
        }
        let game = record.decode(id).map_err(|source| corrupt(id, source))?;
        self.rows.store(id, &record.to_bytes())?;
        Ok(Some(game))
    }
}

fn corrupt(id: GameId, source: CodecError) -> StoreError {
    log::error!("Game {id} has an unreadable record: {source}");
    StoreError::Corrupt { id, source }
}

fn encode(game: &Game) -> StoreResult<GameRecord> {
    GameRecord::encode(game).map_err(|source| corrupt(game.id(), source))
}

impl<B: RowBackend> GameStore for RecordStore<B> {
    fn get(&self, id: GameId) -> StoreResult<Option<Game>> {
        self.load_record(id)?
            .map(|record| record.decode(id).map_err(|source| corrupt(id, source)))
            .transpose()
    }

    fn save(&self, game: &Game) -> StoreResult<()> {
        let _guard = self.write_lock.lock()?;
        let mut record = encode(game)?;
        if let Some(existing) = self.load_record(game.id())? {
            record = GameRecord {
                moves: record.moves,
                flags: record.flags,
                ..existing
            };
            // A same-id game of another size fails to decode here.
            record.decode(game.id()).map_err(|source| corrupt(game.id(), source))?;
        }
        self.rows.store(game.id(), &record.to_bytes())
    }

    fn add_moves(&self, id: GameId, points: &PointSet) -> StoreResult<Option<Game>> {
        self.update(id, |record| {
            for &point in points {
                record.set_move(point)?;
            }
            Ok(())
        })
    }

    fn add_flag(&self, id: GameId, point: Coord2) -> StoreResult<Option<Game>> {
        self.update(id, |record| record.set_flag(point))
    }

    fn remove_flag(&self, id: GameId, point: Coord2) -> StoreResult<Option<Game>> {
        self.update(id, |record| record.clear_flag(point))
    }
}

impl<B: RowBackend> OwnerStore for RecordStore<B> {
    fn add_mapping(&self, owner: &str, id: GameId) -> StoreResult<()> {
        self.rows.store_owner(id, owner)
    }

    fn game_ids_for_owner(&self, owner: &str) -> StoreResult<Vec<GameId>> {
        self.rows.owned_ids(owner)
    }

    fn owner_of(&self, id: GameId) -> StoreResult<Option<String>> {
        self.rows.load_owner(id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRows {
    rows: RwLock<HashMap<GameId, Vec<u8>>>,
    owners: RwLock<HashMap<GameId, String>>,
}

impl RowBackend for MemoryRows {
    fn load(&self, id: GameId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.rows.read()?.get(&id).cloned())
    }

    fn store(&self, id: GameId, row: &[u8]) -> StoreResult<()> {
        self.rows.write()?.insert(id, row.to_vec());
        Ok(())
    }

    fn load_owner(&self, id: GameId) -> StoreResult<Option<String>> {
        Ok(self.owners.read()?.get(&id).cloned())
    }

    fn store_owner(&self, id: GameId, owner: &str) -> StoreResult<()> {
        self.owners.write()?.insert(id, owner.to_owned());
        Ok(())
    }

    fn owned_ids(&self, owner: &str) -> StoreResult<Vec<GameId>> {
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
}

/// One file per game row, plus one per owner mapping.
///
/// Row files are named after the record schema version so a layout change
/// never reads old rows with the new decoder.
#[derive(Debug, Clone)]
pub struct DirectoryRows {
    root: PathBuf,
}

const OWNER_EXTENSION: &str = "owner";

impl DirectoryRows {
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn row_path(&self, id: GameId) -> PathBuf {
        self.root
            .join(format!("{id}.v{}.game", GameRecord::SCHEMA_VERSION))
    }

    fn owner_path(&self, id: GameId) -> PathBuf {
        self.root.join(format!("{id}.{OWNER_EXTENSION}"))
    }

    fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes a uniquely named temp file next to the target and renames it
    /// into place, so readers never see a partial row.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp = Builder::new().prefix(".row-").tempfile_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl RowBackend for DirectoryRows {
    fn load(&self, id: GameId) -> StoreResult<Option<Vec<u8>>> {
        Self::read_optional(&self.row_path(id))
    }

    fn store(&self, id: GameId, row: &[u8]) -> StoreResult<()> {
        self.write_atomic(&self.row_path(id), row)
    }

    fn load_owner(&self, id: GameId) -> StoreResult<Option<String>> {
        Ok(Self::read_optional(&self.owner_path(id))?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn store_owner(&self, id: GameId, owner: &str) -> StoreResult<()> {
        self.write_atomic(&self.owner_path(id), owner.as_bytes())
    }

    fn owned_ids(&self, owner: &str) -> StoreResult<Vec<GameId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(OWNER_EXTENSION) {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
            else {
                log::warn!("Skipping stray owner file {}", path.display());
                continue;
            };
            if fs::read(&path)? == owner.as_bytes() {
                ids.push(GameId(id));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use sweeper_core::{Board, GameAction, GameStatus, Mutation};

    fn game(id: i32) -> Game {
        let board = Board::from_mine_coords((6, 4), &[(0, 0), (5, 3), (2, 2)]).unwrap();
        let mines = board.mine_points();
        let created_at = DateTime::from_timestamp(1_700_000_000, 5_000).unwrap();
        Game::new(GameId(id), board, mines, created_at).unwrap()
    }

    fn exercise(store: &RecordStore<impl RowBackend>) {
        store.save(&game(7)).unwrap();
        assert_eq!(store.get(GameId(7)).unwrap(), Some(game(7)));
        assert_eq!(store.get(GameId(8)).unwrap(), None);

        let updated = store.add_flag(GameId(7), (4, 0)).unwrap().unwrap();
        assert!(updated.is_flagged((4, 0)));

        let updated = store
            .add_moves(GameId(7), &PointSet::from([(4, 0), (1, 3)]))
            .unwrap()
            .unwrap();
        assert!(updated.is_revealed((4, 0)));
        assert!(!updated.is_flagged((4, 0)));

        let updated = store.add_flag(GameId(7), (3, 3)).unwrap().unwrap();
        let updated_again = store.remove_flag(GameId(7), (3, 3)).unwrap().unwrap();
        assert!(updated.is_flagged((3, 3)));
        assert!(updated_again.flag_points().is_empty());

        let lost = store
            .add_moves(GameId(7), game(7).mine_points())
            .unwrap()
            .unwrap();
        assert_eq!(lost.status(), GameStatus::Lost);
        assert_eq!(store.get(GameId(7)).unwrap(), Some(lost));

        assert!(matches!(
            store.add_flag(GameId(7), (6, 0)),
            Err(StoreError::Game(_))
        ));
        assert!(store.add_flag(GameId(99), (0, 0)).unwrap().is_none());

        store.add_mapping("carol", GameId(7)).unwrap();
        store.add_mapping("dave", GameId(3)).unwrap();
        assert_eq!(store.game_ids_for_owner("carol").unwrap(), vec![GameId(7)]);
        assert_eq!(store.owner_of(GameId(3)).unwrap().as_deref(), Some("dave"));
        assert_eq!(store.owner_of(GameId(4)).unwrap(), None);
    }

    fn stale_mine_reveal_after_win_is_dropped(store: &RecordStore<impl RowBackend>) {
        let board = Board::from_mine_coords((3, 3), &[(1, 1)]).unwrap();
        let mines = board.mine_points();
        let created_at = DateTime::from_timestamp(0, 0).unwrap();
        let game = Game::new(GameId(4), board, mines, created_at).unwrap();
        store.save(&game).unwrap();

        let stale = game.plan(GameAction::Reveal, (1, 1)).unwrap();
        let safe: PointSet = (0..3)
            .flat_map(|x| (0..3).map(move |y| (x, y)))
            .filter(|&p| p != (1, 1))
            .collect();
        let won = store.add_moves(GameId(4), &safe).unwrap().unwrap();
        assert_eq!(won.status(), GameStatus::Won);

        assert_eq!(store.apply(GameId(4), &stale).unwrap(), Some(won.clone()));
        assert_eq!(
            store.apply(GameId(4), &Mutation::AddFlag((1, 1))).unwrap(),
            Some(won.clone())
        );
        assert_eq!(store.get(GameId(4)).unwrap(), Some(won));
    }

    #[test]
    fn finished_memory_row_ignores_stale_moves() {
        stale_mine_reveal_after_win_is_dropped(&RecordStore::new(MemoryRows::default()));
    }

    #[test]
    fn finished_directory_row_ignores_stale_moves() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(DirectoryRows::open(dir.path()).unwrap());
        stale_mine_reveal_after_win_is_dropped(&store);
    }

    #[test]
    fn concurrent_owner_writes_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(DirectoryRows::open(dir.path()).unwrap());
        let owners = ["ann", "ben", "cat", "dan", "eve", "fay", "gus", "hal"];

        std::thread::scope(|scope| {
            for owner in owners {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..20 {
                        store.add_mapping(owner, GameId(5)).unwrap();
                    }
                });
            }
        });

        let owner = store.owner_of(GameId(5)).unwrap().unwrap();
        assert!(owners.contains(&owner.as_str()));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "5.owner")
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn memory_rows_behave_like_a_store() {
        exercise(&RecordStore::new(MemoryRows::default()));
    }

    #[test]
    fn directory_rows_behave_like_a_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&RecordStore::new(DirectoryRows::open(dir.path()).unwrap()));
    }

    #[test]
    fn directory_rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut played = game(11);
        played.reveal((3, 0)).unwrap();
        RecordStore::new(DirectoryRows::open(dir.path()).unwrap())
            .save(&played)
            .unwrap();

        let reopened = RecordStore::new(DirectoryRows::open(dir.path()).unwrap());

        assert_eq!(reopened.get(GameId(11)).unwrap(), Some(played));
        assert!(dir.path().join("11.v1.game").exists());
    }

    #[test]
    fn corrupt_row_is_reported() {
        let rows = MemoryRows::default();
        rows.store(GameId(1), &[1, 2, 3]).unwrap();
        let store = RecordStore::new(rows);

        assert!(matches!(
            store.get(GameId(1)),
            Err(StoreError::Corrupt { id: GameId(1), .. })
        ));
    }

    #[test]
    fn save_of_existing_row_replaces_only_moves_and_flags() {
        let store = RecordStore::new(MemoryRows::default());
        store.save(&game(2)).unwrap();

        let mut played = game(2);
        played.reveal((3, 0)).unwrap();
        played.toggle_flag((0, 3)).unwrap();
        store.save(&played).unwrap();

        assert_eq!(store.get(GameId(2)).unwrap(), Some(played));
    }
}
