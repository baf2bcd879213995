use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid board dimensions or mine count")]
    InvalidDimensions,
    #[error("Coordinates out of bounds")]
    OutOfBounds,
    #[error("Game state is incomplete or inconsistent")]
    InvalidState,
}

pub type Result<T> = core::result::Result<T, GameError>;
