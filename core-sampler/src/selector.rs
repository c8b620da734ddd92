//! Time-window selection over a provider listing.
//!
//! Files arrive one at a time in provider order. Each is either accepted
//! (to be fetched and emitted), skipped, or found beyond the horizon, which
//! ends the session. All state lives in a [`SelectionCursor`] owned by one
//! selector, so concurrent sessions never interfere.

use crate::timestamp::parse_capture_time;
use bridge_traits::storage::RemoteFile;
use chrono::{DateTime, Duration, Utc};
use core_runtime::config::StreamDefaults;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_FILES: usize = 10;
pub const DEFAULT_SPACING: i64 = 10;

/// Unit of the spacing parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpacingUnit {
    #[default]
    Minutes,
    Hours,
}

impl SpacingUnit {
    /// Lenient parse: anything other than `hours` means minutes.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn duration(self, amount: i64) -> Duration {
        match self {
            SpacingUnit::Minutes => Duration::minutes(amount),
            SpacingUnit::Hours => Duration::hours(amount),
        }
    }
}

impl FromStr for SpacingUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minutes" => Ok(SpacingUnit::Minutes),
            "hours" => Ok(SpacingUnit::Hours),
            other => Err(format!("unknown unit: {}", other)),
        }
    }
}

/// Parameters of one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Files must be strictly larger than this many bytes.
    pub min_file_size: u64,
    /// Maximum distance from the first candidate.
    pub horizon: Duration,
    /// Minimum distance between consecutive accepted files.
    pub min_gap: Duration,
    pub max_files: usize,
}

impl SelectionConfig {
    pub fn from_defaults(defaults: &StreamDefaults) -> Self {
        Self {
            min_file_size: defaults.min_file_size,
            horizon: Duration::days(i64::from(defaults.horizon_days)),
            min_gap: SpacingUnit::Minutes.duration(DEFAULT_SPACING),
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Apply request parameters; missing, non-positive or unparsable values
    /// keep the defaults.
    pub fn with_request(
        mut self,
        max_files: Option<&str>,
        spacing: Option<&str>,
        unit: Option<&str>,
    ) -> Self {
        if let Some(n) = positive(max_files) {
            self.max_files = usize::try_from(n).unwrap_or(usize::MAX);
        }
        let spacing = positive(spacing).unwrap_or(DEFAULT_SPACING);
        self.min_gap = SpacingUnit::parse_lenient(unit).duration(spacing);
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self::from_defaults(&StreamDefaults::default())
    }
}

fn positive(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        // bounded so the spacing never overflows a chrono Duration
        .map(|n| n.min(1_000_000))
}

/// Rolling state of one selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_accepted: Option<DateTime<Utc>>,
    pub accepted_count: usize,
    /// Walk direction, fixed by the second acceptance.
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Each accepted file is older than the previous one.
    Backward,
    Forward,
}

impl Direction {
    fn of(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        if to < from {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooSmall,
    NoTimestamp,
    TooClose,
    /// On the wrong side of the last accepted file.
    OutOfOrder,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::TooSmall => "too small",
            SkipReason::NoTimestamp => "no timestamp",
            SkipReason::TooClose => "too close to previous",
            SkipReason::OutOfOrder => "out of order",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept(DateTime<Utc>),
    Skip(SkipReason),
    /// Beyond the horizon; nothing further is selected.
    Halt,
}

/// Applies a [`SelectionConfig`] to files one at a time.
///
/// # Examples
///
/// ```
/// use bridge_traits::storage::RemoteFile;
/// use core_sampler::{Decision, SelectionConfig, TimeWindowSelector};
///
/// let file = |name: &str| RemoteFile {
///     id: name.to_string(),
///     name: name.to_string(),
///     mime_type: Some("image/jpeg".to_string()),
///     size: Some(600_000),
///     parent_ids: vec![],
/// };
///
/// let mut selector = TimeWindowSelector::new(SelectionConfig::default());
/// assert!(matches!(selector.evaluate(&file("img2024-01-01-10-00-00.jpg")), Decision::Accept(_)));
/// assert!(matches!(selector.evaluate(&file("img2024-01-01-10-05-00.jpg")), Decision::Skip(_)));
/// assert!(matches!(selector.evaluate(&file("img2024-01-01-10-10-00.jpg")), Decision::Accept(_)));
/// ```
#[derive(Debug, Clone)]
pub struct TimeWindowSelector {
    config: SelectionConfig,
    cursor: SelectionCursor,
}

impl TimeWindowSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            cursor: SelectionCursor::default(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn cursor(&self) -> &SelectionCursor {
        &self.cursor
    }

    /// True once `max_files` files have been accepted.
    pub fn is_satisfied(&self) -> bool {
        self.cursor.accepted_count >= self.config.max_files
    }

    /// Decide on the next file and update the cursor.
    ///
    /// Distances are absolute, so the rules hold whether the provider lists
    /// newest-first or oldest-first. The first two acceptances fix the
    /// direction; later files behind the last accepted one are skipped, so
    /// accepted timestamps stay monotonic. The horizon is checked first.
    pub fn evaluate(&mut self, file: &RemoteFile) -> Decision {
        if !file.size.is_some_and(|size| size > self.config.min_file_size) {
            return Decision::Skip(SkipReason::TooSmall);
        }

        let Some(timestamp) = parse_capture_time(&file.name) else {
            return Decision::Skip(SkipReason::NoTimestamp);
        };

        let first = *self.cursor.first_timestamp.get_or_insert(timestamp);
        if (timestamp - first).abs() > self.config.horizon {
            return Decision::Halt;
        }

        if let Some(last) = self.cursor.last_accepted {
            if (timestamp - last).abs() < self.config.min_gap {
                return Decision::Skip(SkipReason::TooClose);
            }
            let step = Direction::of(last, timestamp);
            match self.cursor.direction {
                Some(direction) if direction != step => {
                    return Decision::Skip(SkipReason::OutOfOrder);
                }
                Some(_) => {}
                None => self.cursor.direction = Some(step),
            }
        }

        self.cursor.last_accepted = Some(timestamp);
        self.cursor.accepted_count += 1;
        Decision::Accept(timestamp)
    }
}
