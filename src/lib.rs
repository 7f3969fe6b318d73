//! Infinite Go: a Go variant on an unbounded board without turns.
//!
//! Instead of alternating moves, who may play where is governed by the lock
//! status of the stones already nearby. A new stone starts `Locked`; every
//! later move within its 13x13 region ages it to `TimeLimited` and then to
//! `Unlocked`, and a time-limited stone that nobody ages is unlocked by a
//! timeout sweep. Groups without liberties are captured as in ordinary Go.
//!
//! ## Modules
//!
//! - [`constants`] - Region geometry and default timeout
//! - [`config`] - Rule tunables
//! - [`clock`] - Time source
//! - [`stone`] - Coordinates, players and stone status
//! - [`store`] - Board persistence (in memory or SQLite)
//! - [`group`] - Group and liberty search
//! - [`validation`] - Move legality
//! - [`evolution`] - Status aging
//! - [`capture`] - Capture and suicide resolution
//! - [`sweep`] - Lock timeout sweep
//! - [`engine`] - The atomic move pipeline
//! - [`render`] - Text drawing of a region
//! - [`protocol`] - Text command server
//! - [`playout`] - Random self-play
//!
//! ## Example
//!
//! ```
//! use infinite_go::config::RulesConfig;
//! use infinite_go::engine::Engine;
//! use infinite_go::stone::{Coord, PlayerId};
//!
//! let engine = Engine::in_memory(RulesConfig::default());
//! engine.bootstrap(&PlayerId::from("origin")).unwrap();
//!
//! let alice = PlayerId::from("alice");
//! engine.play(&alice, Coord::new(1, 0)).unwrap();
//!
//! // Alice's stone is locked, so she cannot play near it again yet.
//! assert!(!engine.is_legal(&alice, Coord::new(2, 0)).unwrap());
//! ```

pub mod capture;
pub mod clock;
pub mod config;
pub mod constants;
pub mod engine;
pub mod evolution;
pub mod group;
pub mod playout;
pub mod protocol;
pub mod render;
pub mod stone;
pub mod store;
pub mod sweep;
pub mod validation;
