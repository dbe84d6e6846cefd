//! Tree configuration constants and tunable parameters.

use std::env;

/// Sizing parameters for one behavior tree.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Byte budget of the node arena. Allocation fails once it is spent.
    pub arena_bytes: usize,
}

impl TreeConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of children a composite node can reference.
    pub const MAX_CHILDREN: usize = 7;
    /// Largest distance, in arena slots, between a node and one of its children.
    pub const MAX_CHILD_OFFSET: usize = u16::MAX as usize;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ARENA_BYTES: usize = 8192;

    pub fn new() -> Self {
        Self {
            arena_bytes: Self::DEFAULT_ARENA_BYTES,
        }
    }

    pub fn with_arena_bytes(arena_bytes: usize) -> Self {
        Self { arena_bytes }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BEHAVIOR_ARENA_BYTES` - Arena byte budget (default: 8192)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(bytes) = read_env::<usize>("BEHAVIOR_ARENA_BYTES") {
            config.arena_bytes = bytes;
        }

        config
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
