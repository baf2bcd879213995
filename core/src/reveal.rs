use alloc::collections::VecDeque;
use ndarray::Array2;

use crate::*;

/// Cells opened by clicking the zero cell at `start`.
///
/// Breadth-first over the Moore neighborhood. Only zero cells expand; their
/// non-zero border is included but not expanded. Membership is tracked on a
/// dense grid so every cell is queued at most once.
pub fn zero_flood_fill(board: &Board, start: Coord2) -> Result<PointSet> {
    let start = board.validate_coords(start)?;

    let mut visited: Array2<bool> = Array2::default(board.size().to_nd_index());
    let mut to_visit = VecDeque::from([start]);
    visited[start.to_nd_index()] = true;

    let mut revealed = PointSet::new();
    while let Some(coords) = to_visit.pop_front() {
        revealed.insert(coords);
        if !board[coords].is_zero() {
            continue;
        }

        for pos in board.iter_neighbors(coords) {
            let seen = &mut visited[pos.to_nd_index()];
            if !*seen {
                *seen = true;
                to_visit.push_back(pos);
            }
        }
    }

    Ok(revealed)
}
