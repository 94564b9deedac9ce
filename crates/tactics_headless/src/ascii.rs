//! Plain-text board rendering for logs and the `board` request.
//!
//! Rows are printed top to bottom, so the highest `y` comes first.
//!
//! | Glyph | Meaning |
//! |-------|---------|
//! | `#` | blocked |
//! | `~` | open, ground weight above 1 |
//! | `.` | open |
//! | `A`, `B`, ... | actor pivot, by side |
//! | `a`, `b`, ... | rest of an actor's body |
//! | `+` | cursor over an empty cell |

use std::fmt::Write;

use tactics_core::prelude::*;

fn side_glyph(side: SideId, pivot: bool) -> char {
    let base = if pivot { b'A' } else { b'a' };
    char::from(base + side.0 % 26)
}

/// Glyph for one cell.
#[must_use]
pub fn cell_glyph(battle: &Battle, coord: CellCoord, cursor: Option<CellCoord>) -> char {
    let Some(cell) = battle.grid().cell(coord) else {
        return ' ';
    };
    if let Some(actor) = cell.cover().and_then(|id| battle.actor(id)) {
        return side_glyph(actor.side, actor.pose.cell == coord);
    }
    if cursor == Some(coord) {
        return '+';
    }
    if !cell.is_open() {
        '#'
    } else if cell.weights().ground > 1 {
        '~'
    } else {
        '.'
    }
}

/// Render the whole board, one line per row.
#[must_use]
pub fn render_board(battle: &Battle, cursor: Option<CellCoord>) -> String {
    let grid = battle.grid();
    let width = i32::try_from(grid.width()).unwrap_or(i32::MAX);
    let height = i32::try_from(grid.height()).unwrap_or(i32::MAX);
    let mut out = String::with_capacity((grid.width() as usize + 1) * grid.height() as usize);
    for y in (0..height).rev() {
        for x in 0..width {
            out.push(cell_glyph(battle, CellCoord::new(x, y), cursor));
        }
        out.push('\n');
    }
    out
}

/// One line per live actor: name, side, pose and health.
#[must_use]
pub fn render_roster(battle: &Battle) -> String {
    let mut out = String::new();
    for actor in battle.actors().iter().filter(|actor| actor.is_alive()) {
        let label = battle
            .turns()
            .roster(actor.side)
            .map_or("?", SideRoster::label);
        let _ = writeln!(
            out,
            "{} {:<10} {:<6} at {} facing {} hp {}",
            side_glyph(actor.side, true),
            actor.name,
            label,
            actor.pose.cell,
            actor.pose.rotation.quarter_turns(),
            actor.health,
        );
    }
    out
}
