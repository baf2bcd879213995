use std::io;

use sweeper_core::{CodecError, GameError, GameId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Row I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Stored row for game {id} is unreadable: {source}")]
    Corrupt { id: GameId, source: CodecError },
    #[error("Store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Game(#[from] GameError),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Game ID is required")]
    MissingId,
    #[error("Game {0} not found")]
    NotFound(GameId),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Board {width}x{height} exceeds the configured limit {max_width}x{max_height}")]
    TooLarge {
        width: u8,
        height: u8,
        max_width: u8,
        max_height: u8,
    },
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
