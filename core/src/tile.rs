use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Byte used for a mine cell in the stored board and in the client view.
pub const MINE_BYTE: i8 = -2;
/// Byte used for a cell the player has not revealed.
pub const UNKNOWN_BYTE: i8 = -1;
/// Byte used for a flagged, unrevealed cell.
pub const FLAG_BYTE: i8 = -3;

/// Ground-truth content of a board cell, fixed once the board is generated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Mine,
    Count(u8),
}

impl CellValue {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Count(0))
    }

    pub const fn to_byte(self) -> i8 {
        match self {
            Self::Mine => MINE_BYTE,
            Self::Count(count) => count as i8,
        }
    }

    pub fn from_byte(byte: i8) -> Result<Self> {
        match byte {
            MINE_BYTE => Ok(Self::Mine),
            0..=8 => Ok(Self::Count(byte as u8)),
            _ => Err(GameError::InvalidState),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// What the player is allowed to see of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewCell {
    Unknown,
    Flag,
    Revealed(CellValue),
}

impl ViewCell {
    pub const fn to_byte(self) -> i8 {
        match self {
            Self::Unknown => UNKNOWN_BYTE,
            Self::Flag => FLAG_BYTE,
            Self::Revealed(value) => value.to_byte(),
        }
    }
}

impl Default for ViewCell {
    fn default() -> Self {
        Self::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_encoding_matches_wire_values() {
        assert_eq!(CellValue::Mine.to_byte(), -2);
        assert_eq!(CellValue::Count(8).to_byte(), 8);
        assert_eq!(ViewCell::Unknown.to_byte(), -1);
        assert_eq!(ViewCell::Flag.to_byte(), -3);
        assert_eq!(ViewCell::Revealed(CellValue::Count(3)).to_byte(), 3);
    }

    #[test]
    fn from_byte_rejects_view_only_values() {
        assert_eq!(CellValue::from_byte(-2), Ok(CellValue::Mine));
        assert_eq!(CellValue::from_byte(0), Ok(CellValue::Count(0)));
        assert_eq!(CellValue::from_byte(-1), Err(GameError::InvalidState));
        assert_eq!(CellValue::from_byte(9), Err(GameError::InvalidState));
    }
}
