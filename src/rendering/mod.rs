//! # Rendering Module
//!
//! Plain-text snapshots of a session. Used as protocol frames and by the console mode;
//! drawing to a real terminal is left to the client.

pub mod display;
pub mod ui;

pub use display::*;
pub use ui::*;

use crate::{GameSession, SessionPhase};

/// Log lines included in a snapshot.
pub const SNAPSHOT_LOG_LINES: usize = 5;

/// Full text frame for a single-player session.
///
/// In battle the map is replaced by the battle panel. A pending reward prompt is shown
/// above the log.
pub fn render_text(session: &GameSession) -> String {
    let mut out = String::new();

    match &session.battle {
        Some(battle) => {
            for line in battle_panel(battle, &session.player) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        None => {
            let marker = Marker::new(session.player.position, '@');
            out.push_str(&render_map(&session.dungeon, &[marker]));
        }
    }

    out.push_str(&status_line(&session.player, session.stage));
    out.push('\n');

    match session.phase {
        SessionPhase::Victory => out.push_str("*** VICTORY ***  ENTER) New game  ESC) Quit\n"),
        SessionPhase::GameOver => out.push_str("*** GAME OVER ***  ENTER) New game  ESC) Quit\n"),
        _ => {}
    }
    if let Some(prompt) = session.pending_reward() {
        out.push_str(&reward_panel(prompt));
        out.push('\n');
    }

    for line in log_lines(&session.log, SNAPSHOT_LOG_LINES) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}
