/// Phase cadences used by the transport scheduler. The action phase runs
/// faster than the flame and bomb phases, matching the original server.
pub const FLAME_TICK_MS: u64 = 1_000;
pub const ACTION_TICK_MS: u64 = 250;
pub const BOMB_TICK_MS: u64 = 1_000;

/// Bomb countdown in bomb-phase ticks from drop to explosion.
pub const BOMB_FUSE_TICKS: u32 = 4;

pub const DEFAULT_FLAME_RANGE: u32 = 1;
pub const DEFAULT_BOMB_CAPACITY: u32 = 1;

/// Destroying a destructible block rolls once: flame powerup, bomb powerup,
/// or nothing for the remaining 0.70.
pub const POWERUP_FLAME_CHANCE: f32 = 0.15;
pub const POWERUP_BOMB_CHANCE: f32 = 0.15;

pub const DEFAULT_PLAYER_NAME: &str = "anonymous";

/// The classic 39x19 arena: indestructible border and pillars, destructible
/// filler, four spawn corners.
pub const DEFAULT_ARENA: &str = "\
BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB
BS ................................. SB
B B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B B
B.....................................B
B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B
B.....................................B
B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B
B.....................................B
B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B
B.....................................B
B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B
B.....................................B
B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B
B.....................................B
B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B
B.....................................B
B B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B.B B
BS ................................. SB
BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
