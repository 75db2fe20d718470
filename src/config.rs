//!
//! coursegate configuration
//! ------------------------
//! Settings are read from `COURSEGATE_*` environment variables with built-in defaults.
//! The binary lets CLI flags override individual values after `Config::from_env()`.

use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::security::DEFAULT_PASSWORD_LENGTH;

pub const ENV_DATA_DIR: &str = "COURSEGATE_DATA_DIR";
pub const ENV_ARGON2_MEMORY_KIB: &str = "COURSEGATE_ARGON2_MEMORY_KIB";
pub const ENV_ARGON2_ITERATIONS: &str = "COURSEGATE_ARGON2_ITERATIONS";
pub const ENV_ARGON2_PARALLELISM: &str = "COURSEGATE_ARGON2_PARALLELISM";
pub const ENV_PASSWORD_LENGTH: &str = "COURSEGATE_PASSWORD_LENGTH";
pub const ENV_NOTIFY: &str = "COURSEGATE_NOTIFY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root folder holding one directory per course, each with a `users.json`.
    pub data_dir: PathBuf,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
    pub password_length: usize,
    /// Default for the `notify` sync option.
    pub notify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("courses"),
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            password_length: DEFAULT_PASSWORD_LENGTH,
            notify: false,
        }
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_num_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(v) => match v.trim().parse::<T>() {
            Ok(n) => n,
            Err(_) => {
                warn!(target: "coursegate::config", "ignoring {}={:?}: not a valid number", name, v);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_bool_env(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => parse_bool(&v).unwrap_or_else(|| {
            warn!(target: "coursegate::config", "ignoring {}={:?}: not a boolean", name, v);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            data_dir: env::var(ENV_DATA_DIR).map(PathBuf::from).unwrap_or(d.data_dir),
            argon2_memory_kib: parse_num_env(ENV_ARGON2_MEMORY_KIB, d.argon2_memory_kib),
            argon2_iterations: parse_num_env(ENV_ARGON2_ITERATIONS, d.argon2_iterations),
            argon2_parallelism: parse_num_env(ENV_ARGON2_PARALLELISM, d.argon2_parallelism),
            password_length: parse_num_env(ENV_PASSWORD_LENGTH, d.password_length),
            notify: parse_bool_env(ENV_NOTIFY, d.notify),
        }
    }
}

/// Install the global tracing subscriber, honouring `RUST_LOG` and defaulting to `info`.
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
