//! Line-oriented command protocol.
//!
//! A small text protocol in the style of GTP, so a front end (or a human on
//! a terminal) can drive an [`Engine`]. Each request is one line, optionally
//! prefixed by a numeric id; each response is `=[id] <text>` on success or
//! `?[id] <text>` on failure, followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `list_commands`, `known_command <cmd>`, `quit`
//! - `player <name>` - Act as `<name>` from now on
//! - `move <x> <y>` - Put the cursor at `(x, y)`
//! - `up|down|left|right [n]` - Shift the cursor
//! - `place [<x> <y>]` - Play at the cursor or at `(x, y)`
//! - `stone [<x> <y>]` - Describe the stone at the cursor or at `(x, y)`
//! - `region` - List the stones around the cursor
//! - `show` - Draw the region around the cursor
//! - `score [<name>]` - Stones on the board for a player
//! - `next` - Jump the cursor to the player's next time-limited stone
//! - `poll <unix-secs>` - The player's stones time-limited since then
//! - `sweep` - Unlock expired time-limited stones now

use std::io::{BufRead, Write};

use anyhow::Context;
use chrono::DateTime;

use crate::clock::Clock;
use crate::engine::{Engine, PlayError};
use crate::render::RegionView;
use crate::stone::{Coord, PlayerId};
use crate::store::BoardStore;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "down",
    "known_command",
    "left",
    "list_commands",
    "move",
    "name",
    "next",
    "place",
    "player",
    "poll",
    "quit",
    "region",
    "right",
    "score",
    "show",
    "stone",
    "sweep",
    "up",
    "version",
];

/// Protocol session state.
pub struct CommandServer<S, C> {
    engine: Engine<S, C>,
    /// Who `place`, `next` and `poll` act for
    player: Option<PlayerId>,
    cursor: Coord,
}

impl<S: BoardStore, C: Clock> CommandServer<S, C> {
    /// A session with no player selected and the cursor on the origin.
    pub fn new(engine: Engine<S, C>) -> Self {
        Self {
            engine,
            player: None,
            cursor: Coord::new(0, 0),
        }
    }

    pub fn engine(&self) -> &Engine<S, C> {
        &self.engine
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("reading command")?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some(first) = parts.first() else {
                continue;
            };
            let command = first.to_lowercase();

            let (success, message) = self.execute(&command, &parts[1..]);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n").context("writing response")?;
            output.flush().context("flushing response")?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Parse `[<x> <y>]`, defaulting to the cursor.
    fn target(&self, args: &[&str]) -> Result<Coord, String> {
        match args {
            [] => Ok(self.cursor),
            [x, y, ..] => {
                let x = x.parse::<i64>().map_err(|_| format!("invalid x: {x}"))?;
                let y = y.parse::<i64>().map_err(|_| format!("invalid y: {y}"))?;
                Ok(Coord::new(x, y))
            }
            [_] => Err("expected both x and y".to_string()),
        }
    }

    fn shift(&mut self, args: &[&str], dx: i64, dy: i64) -> (bool, String) {
        let units = match args.first().map(|a| a.parse::<i64>()) {
            None => 1,
            Some(Ok(n)) => n,
            Some(Err(_)) => return (false, "invalid distance".to_string()),
        };
        let moved = dx
            .checked_mul(units)
            .zip(dy.checked_mul(units))
            .and_then(|(sx, sy)| {
                Some(Coord::new(
                    self.cursor.x.checked_add(sx)?,
                    self.cursor.y.checked_add(sy)?,
                ))
            });
        match moved {
            Some(cursor) => {
                self.cursor = cursor;
                (true, cursor.to_string())
            }
            None => (false, "distance out of range".to_string()),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "player" => match args.first() {
                Some(name) => {
                    let player = PlayerId::new(*name);
                    let msg = player.to_string();
                    self.player = Some(player);
                    (true, msg)
                }
                None => (false, "missing argument".to_string()),
            },

            "move" => match self.target(args) {
                Ok(at) if !args.is_empty() => {
                    self.cursor = at;
                    (true, at.to_string())
                }
                Ok(_) => (false, "missing arguments".to_string()),
                Err(e) => (false, e),
            },
            "up" => self.shift(args, 0, -1),
            "down" => self.shift(args, 0, 1),
            "left" => self.shift(args, -1, 0),
            "right" => self.shift(args, 1, 0),

            "place" => {
                let Some(player) = self.player.clone() else {
                    return (false, "no player selected".to_string());
                };
                let at = match self.target(args) {
                    Ok(at) => at,
                    Err(e) => return (false, e),
                };
                match self.engine.play(&player, at) {
                    Ok(outcome) => {
                        let mut msg = format!("placed {at}");
                        if !outcome.captures.captured.is_empty() {
                            msg.push_str(&format!(
                                ", captured {}",
                                outcome.captures.captured.len()
                            ));
                        }
                        if outcome.captures.is_suicide() {
                            msg.push_str(&format!(
                                ", suicide removed {}",
                                outcome.captures.suicided.len()
                            ));
                        }
                        (true, msg)
                    }
                    Err(PlayError::Rejected(reason)) => (false, reason.to_string()),
                    Err(PlayError::Store(e)) => {
                        tracing::error!(error = %e, "store failure during move");
                        (false, format!("storage error: {e}"))
                    }
                }
            }

            "stone" => {
                let at = match self.target(args) {
                    Ok(at) => at,
                    Err(e) => return (false, e),
                };
                match self.engine.stone_at(at) {
                    Ok(Some(stone)) => (true, format!("{} {}", stone.owner, stone.status)),
                    Ok(None) => (true, "empty".to_string()),
                    Err(e) => (false, format!("storage error: {e}")),
                }
            }

            "region" => match self.engine.region(self.cursor) {
                Ok(region) => {
                    let lines: Vec<String> = region
                        .stones()
                        .map(|s| format!("{} {} {} {}", s.at.x, s.at.y, s.owner, s.status))
                        .collect();
                    (true, lines.join("\n"))
                }
                Err(e) => (false, format!("storage error: {e}")),
            },

            "show" => match self.engine.region(self.cursor) {
                Ok(region) => {
                    let view = RegionView::new(&region, self.player.as_ref());
                    (true, format!("{}\n{view}", self.cursor))
                }
                Err(e) => (false, format!("storage error: {e}")),
            },

            "score" => {
                let player = match args.first() {
                    Some(name) => PlayerId::new(*name),
                    None => match &self.player {
                        Some(p) => p.clone(),
                        None => return (false, "no player selected".to_string()),
                    },
                };
                match self.engine.score(&player) {
                    Ok(n) => (true, n.to_string()),
                    Err(e) => (false, format!("storage error: {e}")),
                }
            }

            "next" => {
                let Some(player) = self.player.clone() else {
                    return (false, "no player selected".to_string());
                };
                match self.engine.next_time_limited(&player, self.cursor) {
                    Ok(Some(at)) => {
                        self.cursor = at;
                        (true, at.to_string())
                    }
                    Ok(None) => (true, self.cursor.to_string()),
                    Err(e) => (false, format!("storage error: {e}")),
                }
            }

            "poll" => {
                let Some(player) = self.player.clone() else {
                    return (false, "no player selected".to_string());
                };
                let Some(since) = args
                    .first()
                    .and_then(|s| s.parse::<i64>().ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                else {
                    return (false, "expected a unix timestamp".to_string());
                };
                match self.engine.time_limited_since(&player, since) {
                    Ok(stones) => {
                        let coords: Vec<String> =
                            stones.iter().map(|s| format!("{} {}", s.at.x, s.at.y)).collect();
                        (true, coords.join("\n"))
                    }
                    Err(e) => (false, format!("storage error: {e}")),
                }
            }

            "sweep" => match self.engine.sweep() {
                Ok(unlocked) => (true, unlocked.len().to_string()),
                Err(e) => (false, format!("storage error: {e}")),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RulesConfig;
    use crate::store::MemoryStore;

    fn server() -> CommandServer<MemoryStore, ManualClock> {
        let engine = Engine::new(
            MemoryStore::new(),
            ManualClock::at_epoch(),
            RulesConfig::default(),
        );
        engine.bootstrap(&PlayerId::from("origin")).unwrap();
        CommandServer::new(engine)
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = CommandServer::<MemoryStore, ManualClock>::parse_id("123 place 1 2");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "place 1 2");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = CommandServer::<MemoryStore, ManualClock>::parse_id("show");
        assert_eq!(id, None);
        assert_eq!(cmd, "show");
    }

    #[test]
    fn test_place_requires_player() {
        let mut s = server();
        let (success, msg) = s.execute("place", &["1", "0"]);
        assert!(!success);
        assert_eq!(msg, "no player selected");
    }

    #[test]
    fn test_place_and_describe() {
        let mut s = server();
        assert!(s.execute("player", &["alice"]).0);
        let (success, msg) = s.execute("place", &["1", "0"]);
        assert!(success, "{msg}");
        assert_eq!(s.execute("stone", &["1", "0"]), (true, "alice Locked".to_string()));
        assert_eq!(s.execute("stone", &["9", "9"]), (true, "empty".to_string()));
        assert_eq!(s.execute("score", &[]), (true, "1".to_string()));
    }

    #[test]
    fn test_rejection_reason_is_reported() {
        let mut s = server();
        s.execute("player", &["alice"]);
        s.execute("place", &["1", "0"]);
        let (success, msg) = s.execute("place", &["2", "0"]);
        assert!(!success);
        assert!(msg.contains("still locked"), "{msg}");
    }

    #[test]
    fn test_cursor_moves() {
        let mut s = server();
        assert_eq!(s.execute("right", &["3"]), (true, "(3, 0)".to_string()));
        assert_eq!(s.execute("up", &[]), (true, "(3, -1)".to_string()));
        assert_eq!(s.execute("move", &["-7", "8"]), (true, "(-7, 8)".to_string()));
        assert!(!s.execute("left", &["x"]).0);
    }

    #[test]
    fn test_cursor_overflow_is_refused() {
        let mut s = server();
        let max = i64::MAX.to_string();
        let min = i64::MIN.to_string();
        assert_eq!(s.execute("right", &[max.as_str()]), (true, format!("({max}, 0)")));
        assert_eq!(
            s.execute("right", &[]),
            (false, "distance out of range".to_string())
        );
        assert_eq!(s.execute("down", &[min.as_str()]), (true, format!("({max}, {min})")));
        assert!(!s.execute("up", &[max.as_str()]).0);
        assert!(!s.execute("left", &["-1"]).0);
        assert_eq!(s.cursor, Coord::new(i64::MAX, i64::MIN));
    }

    #[test]
    fn test_far_placement_is_rejected_and_board_keeps_working() {
        let mut s = server();
        s.execute("player", &["alice"]);
        let (success, msg) = s.execute("place", &["9223372036854775807", "0"]);
        assert!(!success);
        assert!(msg.contains("beyond the playable board"), "{msg}");
        assert!(s.execute("show", &[]).0);
        assert_eq!(s.execute("place", &["1", "0"]), (true, "placed (1, 0)".to_string()));
    }

    #[test]
    fn test_run_loop_formats_responses() {
        let mut s = server();
        let input = "1 player bob\n# comment\n\n2 place 0 1\nbogus\nquit\nplace 0 2\n";
        let mut out = Vec::new();
        s.run(input.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "=1 bob\n\n=2 placed (0, 1)\n\n? unknown command: bogus\n\n= \n\n"
        );
    }
}
