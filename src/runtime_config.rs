//! # Runtime Configuration
//!
//! Environment variables that tune the server runtime and the buffer pool.
//!
//! ## Environment Variables
//!
//! ### `RENDERWARE_STACK_SIZE`
//!
//! Stack size for request coroutines. Accepts decimal (`65536`) or
//! hexadecimal (`0x10000`). Default: `0x10000` (64 KB).
//!
//! Template execution recurses through includes and nested blocks, so the
//! default is larger than a plain static file server would need.
//!
//! ### `RENDERWARE_POOL_IDLE`
//!
//! Maximum number of idle response buffers kept for reuse. Default: `64`.
//!
//! ### `RENDERWARE_POOL_MAX_CAPACITY`
//!
//! Largest buffer capacity, in bytes, that is returned to the pool after a
//! request. Bigger buffers are freed. Accepts decimal or hexadecimal.
//! Default: `1048576` (1 MiB).
//!
//! ## Usage
//!
//! ```rust
//! use renderware::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! let pool = config.buffer_pool();
//! assert_eq!(pool.idle(), 0);
//! ```

use crate::pool::{BufferPool, DEFAULT_MAX_IDLE, DEFAULT_MAX_RETAINED_CAPACITY};
use std::env;

/// Default coroutine stack size in bytes.
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 64 KB / 0x10000)
    pub stack_size: usize,
    /// Idle buffers kept by the pool
    pub pool_max_idle: usize,
    /// Largest buffer capacity the pool keeps
    pub pool_max_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            pool_max_idle: DEFAULT_MAX_IDLE,
            pool_max_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let size = |key: &str, default: usize| {
            lookup(key)
                .and_then(|val| parse_size(&val))
                .unwrap_or(default)
        };
        Self {
            stack_size: size("RENDERWARE_STACK_SIZE", defaults.stack_size),
            pool_max_idle: size("RENDERWARE_POOL_IDLE", defaults.pool_max_idle),
            pool_max_capacity: size("RENDERWARE_POOL_MAX_CAPACITY", defaults.pool_max_capacity),
        }
    }

    /// A buffer pool sized by this configuration.
    #[must_use]
    pub fn buffer_pool(&self) -> BufferPool {
        BufferPool::new(self.pool_max_idle, self.pool_max_capacity)
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
