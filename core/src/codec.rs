//! Fixed-layout storage record for a [`Game`].
//!
//! ```text
//! width:i32 | height:i32 | board:[i8; w*h] | mines:[(i32, i32); n]
//!   | moves:[u8; ceil(w*h/8)] | flags:[u8; ceil(w*h/8)] | created_at:i64
//! ```
//!
//! All integers are little-endian. Board bytes and bitmask bits share the
//! `x * height + y` ordering; bitmask bits are MSB-first within each byte.
//! The creation time is kept with microsecond precision.

use alloc::vec::Vec;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use thiserror::Error;

use crate::*;

const HEADER_LEN: usize = 8;
const TIMESTAMP_LEN: usize = 8;
const POINT_LEN: usize = 8;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Record is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Record too short to hold a header")]
    Truncated,
    #[error("Unsupported board size {0}x{1}")]
    InvalidDimensions(i32, i32),
    #[error("Invalid board cell byte {0}")]
    InvalidCell(i8),
    #[error("Mine point ({0}, {1}) is outside the board")]
    InvalidPoint(i32, i32),
    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Number of bytes in a bitmask covering `cells` cells.
pub const fn bitmask_len(cells: usize) -> usize {
    cells.div_ceil(8)
}

pub fn bit_is_set(mask: &[u8], index: usize) -> bool {
    mask.get(index / 8)
        .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
}

pub fn set_bit(mask: &mut [u8], index: usize) {
    if let Some(byte) = mask.get_mut(index / 8) {
        *byte |= 0x80 >> (index % 8);
    }
}

pub fn clear_bit(mask: &mut [u8], index: usize) {
    if let Some(byte) = mask.get_mut(index / 8) {
        *byte &= !(0x80 >> (index % 8));
    }
}

fn pack_bitmask(points: &PointSet, (width, height): Coord2) -> Vec<u8> {
    let mut mask = alloc::vec![0; bitmask_len(usize::from(mult(width, height)))];
    for &coords in points {
        set_bit(&mut mask, flat_index(coords, height));
    }
    mask
}

fn unpack_bitmask(mask: &[u8], (width, height): Coord2) -> PointSet {
    (0..usize::from(mult(width, height)))
        .filter(|&index| bit_is_set(mask, index))
        .map(|index| coords_at(index, height))
        .collect()
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    let mut buf = [0; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(buf)
}

fn read_i64(bytes: &[u8], at: usize) -> i64 {
    let mut buf = [0; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    i64::from_le_bytes(buf)
}

/// Decoded columns of a stored game, one field per column of the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRecord {
    pub width: i32,
    pub height: i32,
    pub board: Vec<u8>,
    pub mine_points: Vec<u8>,
    pub moves: Vec<u8>,
    pub flags: Vec<u8>,
    pub created_at: i64,
}

impl GameRecord {
    /// Bumped whenever the byte layout changes.
    pub const SCHEMA_VERSION: u16 = 1;

    pub fn encode(game: &Game) -> core::result::Result<Self, CodecError> {
        let board = game.board();
        if board.total_cells() == 0 {
            return Err(GameError::InvalidState.into());
        }
        let size = board.size();

        let mut mine_points = Vec::with_capacity(game.mine_points().len() * POINT_LEN);
        for &(x, y) in game.mine_points() {
            mine_points.extend_from_slice(&i32::from(x).to_le_bytes());
            mine_points.extend_from_slice(&i32::from(y).to_le_bytes());
        }

        Ok(Self {
            width: size.0.into(),
            height: size.1.into(),
            board: board.iter_cells().map(|cell| cell.to_byte() as u8).collect(),
            mine_points,
            moves: pack_bitmask(game.moves(), size),
            flags: pack_bitmask(game.flag_points(), size),
            created_at: game.created_at().timestamp_micros(),
        })
    }

    pub fn decode(&self, id: GameId) -> core::result::Result<Game, CodecError> {
        let size = self.size()?;
        let cells = usize::from(mult(size.0, size.1));
        if self.board.len() != cells {
            return Err(CodecError::LengthMismatch {
                expected: cells,
                actual: self.board.len(),
            });
        }
        let mask_len = bitmask_len(cells);
        for mask in [&self.moves, &self.flags] {
            if mask.len() != mask_len {
                return Err(CodecError::LengthMismatch {
                    expected: mask_len,
                    actual: mask.len(),
                });
            }
        }
        if self.mine_points.len() % POINT_LEN != 0 {
            return Err(CodecError::LengthMismatch {
                expected: self.mine_points.len() / POINT_LEN * POINT_LEN,
                actual: self.mine_points.len(),
            });
        }

        let values = self
            .board
            .iter()
            .map(|&byte| CellValue::from_byte(byte as i8).map_err(|_| CodecError::InvalidCell(byte as i8)))
            .collect::<core::result::Result<Vec<_>, _>>()?;
        let cells = Array2::from_shape_vec(size.to_nd_index(), values)
            .map_err(|_| GameError::InvalidState)?;
        let board = Board::from_cells(cells)?;

        let mut mine_points = PointSet::new();
        for chunk in self.mine_points.chunks_exact(POINT_LEN) {
            let (x, y) = (read_i32(chunk, 0), read_i32(chunk, 4));
            let coords = Coord::try_from(x)
                .ok()
                .zip(Coord::try_from(y).ok())
                .filter(|&coords| board.contains(coords))
                .ok_or(CodecError::InvalidPoint(x, y))?;
            mine_points.insert(coords);
        }

        let created_at = DateTime::<Utc>::from_timestamp_micros(self.created_at)
            .ok_or(CodecError::InvalidTimestamp(self.created_at))?;

        Ok(Game::from_parts(
            id,
            board,
            mine_points,
            unpack_bitmask(&self.moves, size),
            unpack_bitmask(&self.flags, size),
            created_at,
        )?)
    }

    pub fn size(&self) -> core::result::Result<Coord2, CodecError> {
        let invalid = || CodecError::InvalidDimensions(self.width, self.height);
        let width = Coord::try_from(self.width).map_err(|_| invalid())?;
        let height = Coord::try_from(self.height).map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok((width, height))
    }

    pub fn mine_count(&self) -> usize {
        self.mine_points.len() / POINT_LEN
    }

    /// Marks `coords` revealed in place; a revealed cell drops its flag.
    pub fn set_move(&mut self, coords: Coord2) -> core::result::Result<(), CodecError> {
        let index = self.bit_index(coords)?;
        set_bit(&mut self.moves, index);
        clear_bit(&mut self.flags, index);
        Ok(())
    }

    pub fn set_flag(&mut self, coords: Coord2) -> core::result::Result<(), CodecError> {
        let index = self.bit_index(coords)?;
        if !bit_is_set(&self.moves, index) {
            set_bit(&mut self.flags, index);
        }
        Ok(())
    }

    pub fn clear_flag(&mut self, coords: Coord2) -> core::result::Result<(), CodecError> {
        let index = self.bit_index(coords)?;
        clear_bit(&mut self.flags, index);
        Ok(())
    }

    fn bit_index(&self, coords: Coord2) -> core::result::Result<usize, CodecError> {
        let (width, height) = self.size()?;
        if coords.0 < width && coords.1 < height {
            Ok(flat_index(coords, height))
        } else {
            Err(GameError::OutOfBounds.into())
        }
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self.board.len()
            + self.mine_points.len()
            + self.moves.len()
            + self.flags.len()
            + TIMESTAMP_LEN
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.board);
        bytes.extend_from_slice(&self.mine_points);
        bytes.extend_from_slice(&self.moves);
        bytes.extend_from_slice(&self.flags);
        bytes.extend_from_slice(&self.created_at.to_le_bytes());
        bytes
    }

    /// Splits a flat record; the mine list length is whatever remains once
    /// the size-determined sections are accounted for.
    pub fn from_bytes(bytes: &[u8]) -> core::result::Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated);
        }
        let width = read_i32(bytes, 0);
        let height = read_i32(bytes, 4);
        let header = Self {
            width,
            height,
            board: Vec::new(),
            mine_points: Vec::new(),
            moves: Vec::new(),
            flags: Vec::new(),
            created_at: 0,
        };
        let size = header.size()?;
        let cells = usize::from(mult(size.0, size.1));
        let mask_len = bitmask_len(cells);

        let fixed_len = HEADER_LEN + cells + 2 * mask_len + TIMESTAMP_LEN;
        let mines_len = bytes
            .len()
            .checked_sub(fixed_len)
            .filter(|len| len % POINT_LEN == 0)
            .ok_or(CodecError::LengthMismatch {
                expected: fixed_len,
                actual: bytes.len(),
            })?;

        let mut at = HEADER_LEN;
        let mut take = |len: usize| {
            let section = bytes[at..at + len].to_vec();
            at += len;
            section
        };
        let board = take(cells);
        let mine_points = take(mines_len);
        let moves = take(mask_len);
        let flags = take(mask_len);
        let created_at = read_i64(bytes, bytes.len() - TIMESTAMP_LEN);

        Ok(Self {
            board,
            mine_points,
            moves,
            flags,
            created_at,
            ..header
        })
    }
}

/// Encodes a game to its flat storage bytes.
pub fn encode(game: &Game) -> core::result::Result<Vec<u8>, CodecError> {
    Ok(GameRecord::encode(game)?.to_bytes())
}

/// Rebuilds the game stored under `id` from its flat storage bytes.
pub fn decode(id: GameId, bytes: &[u8]) -> core::result::Result<Game, CodecError> {
    GameRecord::from_bytes(bytes)?.decode(id)
}
