//! Generation stamps for published cache snapshots.
//!
//! A [`HybridTimestamp`] pairs wall-clock milliseconds with a logical counter,
//! so a node can issue strictly increasing stamps even when two reloads land
//! in the same millisecond, and can fold in stamps observed from other nodes.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Error;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A hybrid logical clock reading.
///
/// Ordered by `wall_time` first, then by `logical`. The text form is
/// `wall_time:logical` (e.g. `1700000000000:3`); a bare number is accepted
/// when parsing and means `logical = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HybridTimestamp {
    /// Milliseconds since the Unix epoch.
    wall_time: u64,
    /// Tie-breaker for stamps issued within the same millisecond.
    logical: u32,
}

impl HybridTimestamp {
    /// The smallest possible stamp. Every issued stamp is newer than this.
    pub const EPOCH: Self = Self::new(0, 0);

    /// Reads the current wall clock.
    #[must_use]
    pub fn now() -> Self {
        Self {
            wall_time: now_millis(),
            logical: 0,
        }
    }

    #[must_use]
    pub const fn new(wall_time: u64, logical: u32) -> Self {
        Self { wall_time, logical }
    }

    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    #[must_use]
    pub const fn logical(&self) -> u32 {
        self.logical
    }

    /// Issues the next stamp after `self`.
    ///
    /// The result is always strictly greater than `self`: it follows the wall
    /// clock when the clock has moved past `self`, and otherwise bumps the
    /// logical counter.
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = now_millis();
        if now > self.wall_time {
            Self::new(now, 0)
        } else {
            Self::new(self.wall_time, self.logical.saturating_add(1))
        }
    }

    /// Folds a stamp observed from another node into this clock.
    ///
    /// The result is strictly greater than both `self` and `other`.
    #[must_use]
    pub fn receive(&self, other: &Self) -> Self {
        let now = now_millis();
        let max_wall = now.max(self.wall_time).max(other.wall_time);

        let logical = match (max_wall == self.wall_time, max_wall == other.wall_time) {
            (true, true) => self.logical.max(other.logical).saturating_add(1),
            (true, false) => self.logical.saturating_add(1),
            (false, true) => other.logical.saturating_add(1),
            (false, false) => 0,
        };

        Self::new(max_wall, logical)
    }

    /// Returns true if `self` is strictly newer than `other`.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl Default for HybridTimestamp {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl PartialOrd for HybridTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HybridTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_time
            .cmp(&other.wall_time)
            .then(self.logical.cmp(&other.logical))
    }
}

impl fmt::Display for HybridTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.wall_time, self.logical)
    }
}

impl FromStr for HybridTimestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::InvalidTimestamp(s.to_string());

        let (wall, logical) = match s.split_once(':') {
            Some((wall, logical)) => (wall, Some(logical)),
            None => (s, None),
        };

        let wall_time = wall.parse::<u64>().map_err(|_| invalid())?;
        let logical = match logical {
            Some(l) => l.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self::new(wall_time, logical))
    }
}
