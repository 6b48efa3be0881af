//! # Cryptcrawl
//!
//! A turn-based dungeon crawler: a procedurally generated maze of rooms and corridors is
//! explored by a player character who fights monsters, collects loot, and levels up across
//! three escalating stages.
//!
//! ## Architecture Overview
//!
//! - **Generation**: stage profiles, room placement, corridor chaining, obstacle carving and
//!   entity spawning ([`generation`])
//! - **Combat**: pure damage/defense/evasion formulas, skills and status effects ([`combat`])
//! - **Game**: the [`GameSession`] aggregate, the battle sequencer, loot and leveling,
//!   monster AI and the message log ([`game`])
//! - **Input / Rendering / Net**: token decoding, a plain-text snapshot, and the line protocol
//!   used by the two-player lobby
//!
//! All randomness flows through a caller-owned [`rand::rngs::StdRng`], so a seed fully
//! determines a run.

pub mod combat;
pub mod game;
pub mod generation;
pub mod input;
pub mod net;
pub mod rendering;

// Core module re-exports
pub use combat::*;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;

/// Core error type for the crawler engine.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed line on the multiplayer protocol
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type used throughout the crawler codebase.
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default dungeon width in tiles
    pub const DEFAULT_DUNGEON_WIDTH: u32 = 80;

    /// Default dungeon height in tiles
    pub const DEFAULT_DUNGEON_HEIGHT: u32 = 40;

    /// Smallest map width the generator accepts
    pub const MIN_DUNGEON_WIDTH: u32 = 40;

    /// Smallest map height the generator accepts
    pub const MIN_DUNGEON_HEIGHT: u32 = 20;

    /// Number of stages before the game is won
    pub const STAGE_COUNT: u32 = 3;

    /// Entries kept by the in-game message log
    pub const LOG_CAPACITY: usize = 50;

    /// Ticks a damage animation blinks before its continuation runs
    pub const ANIMATION_BLINKS: u32 = 6;

    /// Squared distance under which a monster chases the player
    pub const AGGRO_RANGE_SQUARED: i32 = 36;

    /// Ticks per second of the cooperative game loop
    pub const TICKS_PER_SECOND: u64 = 20;

    /// Maximum peers in the multiplayer lobby
    pub const MAX_PEERS: usize = 2;
}
