use std::fmt::Write;

use sweeper_core::{CellValue, GameStatus, GameView, ViewCell};

fn cell_char(cell: ViewCell) -> char {
    match cell {
        ViewCell::Unknown => '#',
        ViewCell::Flag => 'F',
        ViewCell::Revealed(CellValue::Mine) => '*',
        ViewCell::Revealed(CellValue::Count(0)) => '.',
        ViewCell::Revealed(CellValue::Count(n)) => char::from(b'0' + n),
    }
}

/// Text board with `y` growing downwards, followed by a status line.
pub fn render(view: &GameView) -> String {
    let (width, height) = view.size;
    let mut out = String::new();

    for y in 0..height {
        for x in 0..width {
            out.push(cell_char(view.cell_at((x, y))));
        }
        out.push('\n');
    }

    let status = match view.status {
        GameStatus::Active => "in progress",
        GameStatus::Won => "won",
        GameStatus::Lost => "lost",
    };
    let _ = writeln!(
        out,
        "game {} {}x{}: {status}, {} mines, {} flagged",
        view.id,
        width,
        height,
        view.mine_count,
        view.flag_points.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use sweeper_core::{Board, Game, GameId};

    use super::*;

    #[test]
    fn renders_masked_rows() {
        let board = Board::from_mine_coords((3, 2), &[(2, 0)]).unwrap();
        let mines = board.mine_points();
        let created_at = DateTime::from_timestamp(0, 0).unwrap();
        let mut game = Game::new(GameId(9), board, mines, created_at).unwrap();
        game.reveal((0, 0)).unwrap();
        game.toggle_flag((2, 0)).unwrap();

        let text = render(&GameView::from_game(&game));

        assert_eq!(
            text,
            ".1F\n.1#\ngame 9 3x2: in progress, 1 mines, 1 flagged\n"
        );
    }
}
