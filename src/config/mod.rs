//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Rectangular play-area bounds, enforced by clamping after movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl MapBounds {
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }

    pub fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(self.min_y, self.max_y)
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            min_x: 100.0,
            max_x: 2000.0,
            min_y: 100.0,
            max_y: 2000.0,
        }
    }
}

/// What happens to a player's score entry when the connection goes away.
///
/// The id space is monotonic, so a retained entry never rejoins broadcasts;
/// the policy exists for operators that want the table kept for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScorePolicy {
    /// Keep the score entry after disconnect.
    Persist,
    /// Drop the score entry with the rest of the player state.
    Reset,
}

impl FromStr for ScorePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "persist" => Ok(Self::Persist),
            "reset" => Ok(Self::Reset),
            _ => Err(()),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Simulation tick period
    pub tick_interval: Duration,
    /// Units moved per tick per held movement key
    pub move_speed: f32,
    /// Degrees of yaw per tick while a rotation intent is active
    pub rotate_speed: f32,
    /// Play-area bounds
    pub map_bounds: MapBounds,

    /// Maximum hitscan ray length
    pub fire_ray_length: f32,
    /// Collision sphere radius used for hit tests
    pub collision_radius: f32,
    /// Health removed per registered hit
    pub fire_damage: u32,
    /// Score awarded to the shooter per registered hit
    pub score_per_hit: u32,

    /// Cadence of the `s|...` score broadcast
    pub score_broadcast_interval: Duration,
    /// Cadence of the dead-connection sweep
    pub health_check_interval: Duration,

    /// Inbound message budget per tick period, per connection
    pub max_msgs_per_tick: u32,
    /// Inbound message budget per second, per connection
    pub max_msgs_per_second: u32,

    /// Score retention policy on disconnect
    pub score_policy: ScorePolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8888".to_string())
        };

        let bounds = MapBounds {
            min_x: parse_var("MAP_MIN_X", 100.0)?,
            max_x: parse_var("MAP_MAX_X", 2000.0)?,
            min_y: parse_var("MAP_MIN_Y", 100.0)?,
            max_y: parse_var("MAP_MAX_Y", 2000.0)?,
        };
        if bounds.min_x > bounds.max_x || bounds.min_y > bounds.max_y {
            return Err(ConfigError::InvalidBounds);
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            tick_interval: Duration::from_millis(parse_var("TICK_INTERVAL_MS", 50u64)?),
            move_speed: parse_var("MOVE_SPEED", 2.5)?,
            rotate_speed: parse_var("ROTATE_SPEED", 3.0)?,
            map_bounds: bounds,

            fire_ray_length: parse_var("FIRE_RAY_LENGTH", 1000.0)?,
            collision_radius: parse_var("COLLISION_RADIUS", 50.0)?,
            fire_damage: parse_var("FIRE_DAMAGE", 2u32)?,
            score_per_hit: parse_var("SCORE_PER_HIT", 1u32)?,

            score_broadcast_interval: Duration::from_secs(parse_var(
                "SCORE_BROADCAST_SECS",
                5u64,
            )?),
            health_check_interval: Duration::from_secs(parse_var("HEALTH_CHECK_SECS", 5u64)?),

            max_msgs_per_tick: parse_var("MAX_MSGS_PER_TICK", 10u32)?,
            max_msgs_per_second: parse_var("MAX_MSGS_PER_SECOND", 100u32)?,

            score_policy: parse_var("SCORE_POLICY", ScorePolicy::Persist)?,
        })
    }
}

/// Parse an optional environment variable, falling back to a default.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Map bounds minimum exceeds maximum")]
    InvalidBounds,
}
