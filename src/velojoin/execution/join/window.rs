//! Join Window Specification
//!
//! A join window describes how far apart, in event time, two records with the
//! same key may be and still join:
//!
//! ```text
//!   right.time - left.time  ∈  [-before_ms, +after_ms]
//! ```
//!
//! The name is a namespace only (it labels the buffers and error messages)
//! and has no effect on matching.

use serde::{Deserialize, Serialize};

use crate::velojoin::error::{JoinError, JoinResult};

/// Immutable time window for a stream-stream join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWindowSpec {
    /// Window name (namespace only)
    pub name: String,
    /// How far a right record may precede a left record (milliseconds)
    pub before_ms: i64,
    /// How far a right record may follow a left record (milliseconds)
    pub after_ms: i64,
    /// Optional buffer retention override (milliseconds)
    ///
    /// Must not be smaller than the span either buffer needs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_ms: Option<i64>,
}

impl JoinWindowSpec {
    /// Start a window with the given name and zero bounds
    pub fn of(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before_ms: 0,
            after_ms: 0,
            retention_ms: None,
        }
    }

    /// Symmetric window: `before_ms == after_ms == window_ms`
    pub fn within(mut self, window_ms: i64) -> Self {
        self.before_ms = window_ms;
        self.after_ms = window_ms;
        self
    }

    /// Set the lower bound only
    pub fn before(mut self, before_ms: i64) -> Self {
        self.before_ms = before_ms;
        self
    }

    /// Set the upper bound only
    pub fn after(mut self, after_ms: i64) -> Self {
        self.after_ms = after_ms;
        self
    }

    /// Keep buffered records for `retention_ms` behind the buffer watermark
    pub fn until(mut self, retention_ms: i64) -> Self {
        self.retention_ms = Some(retention_ms);
        self
    }

    pub fn is_symmetric(&self) -> bool {
        self.before_ms == self.after_ms
    }

    /// Total width of the window
    pub fn size_ms(&self) -> i64 {
        self.before_ms.saturating_add(self.after_ms)
    }

    /// Retention of the left buffer.
    ///
    /// Right arrivals at `T` probe left entries down to `T - after_ms`.
    pub fn left_retention_ms(&self) -> i64 {
        self.retention_ms.unwrap_or(0).max(self.after_ms)
    }

    /// Retention of the right buffer.
    ///
    /// Left arrivals at `T` probe right entries down to `T - before_ms`.
    pub fn right_retention_ms(&self) -> i64 {
        self.retention_ms.unwrap_or(0).max(self.before_ms)
    }

    /// Check the bounds, failing with a configuration error
    pub fn validate(&self) -> JoinResult<()> {
        if self.before_ms < 0 {
            return Err(JoinError::configuration(
                &self.name,
                format!("before_ms must be non-negative, got {}", self.before_ms),
            ));
        }
        if self.after_ms < 0 {
            return Err(JoinError::configuration(
                &self.name,
                format!("after_ms must be non-negative, got {}", self.after_ms),
            ));
        }
        if let Some(retention_ms) = self.retention_ms {
            let span = self.before_ms.max(self.after_ms);
            if retention_ms < span {
                return Err(JoinError::configuration(
                    &self.name,
                    format!(
                        "retention_ms ({}) cannot be smaller than the window span ({})",
                        retention_ms, span
                    ),
                ));
            }
        }
        Ok(())
    }
}
