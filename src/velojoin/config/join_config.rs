//! Join configuration
//!
//! `JoinConfig` bundles everything a join needs at construction time: the
//! window, the join type and the serializer/deserializer formats declared for
//! each slot. All of it is checked once by [`JoinConfig::validate`]; a join
//! that fails validation is never built.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::velojoin::error::{JoinError, JoinResult};
use crate::velojoin::execution::join::{JoinSide, JoinWindowSpec};

/// Type of join to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    /// Inner join - only matching records from both sides
    #[default]
    Inner,
    /// Left outer join - unmatched left arrivals are emitted with an absent right value
    LeftOuter,
    /// Right outer join - unmatched right arrivals are emitted with an absent left value
    RightOuter,
    /// Full outer join - unmatched arrivals on either side are emitted
    FullOuter,
}

impl JoinType {
    /// Whether an arrival on `side` with no match emits a speculative row
    pub fn emits_unmatched(&self, side: JoinSide) -> bool {
        matches!(
            (self, side),
            (JoinType::FullOuter, _)
                | (JoinType::LeftOuter, JoinSide::Left)
                | (JoinType::RightOuter, JoinSide::Right)
        )
    }

    pub fn is_outer(&self) -> bool {
        !matches!(self, JoinType::Inner)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::LeftOuter => "LEFT_OUTER",
            JoinType::RightOuter => "RIGHT_OUTER",
            JoinType::FullOuter => "FULL_OUTER",
        };
        f.write_str(name)
    }
}

/// Wire format of a key or value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationFormat {
    #[default]
    String,
    Integer,
    Long,
    Bytes,
    Json,
    Avro,
    Protobuf,
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SerializationFormat::String => "string",
            SerializationFormat::Integer => "integer",
            SerializationFormat::Long => "long",
            SerializationFormat::Bytes => "bytes",
            SerializationFormat::Json => "json",
            SerializationFormat::Avro => "avro",
            SerializationFormat::Protobuf => "protobuf",
        };
        f.write_str(name)
    }
}

/// Serializer/deserializer declared for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatPair {
    pub serializer: SerializationFormat,
    pub deserializer: SerializationFormat,
}

impl FormatPair {
    /// Same format in both directions
    pub fn symmetric(format: SerializationFormat) -> Self {
        Self {
            serializer: format,
            deserializer: format,
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.serializer == self.deserializer
    }
}

/// Formats for the shared key and each side's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerdeConfig {
    #[serde(default)]
    pub key: FormatPair,
    #[serde(default)]
    pub left_value: FormatPair,
    #[serde(default)]
    pub right_value: FormatPair,
}

impl SerdeConfig {
    fn validate(&self, join: &str) -> JoinResult<()> {
        for (slot, pair) in [
            ("key", &self.key),
            ("left_value", &self.left_value),
            ("right_value", &self.right_value),
        ] {
            if !pair.is_compatible() {
                return Err(JoinError::configuration(
                    join,
                    format!(
                        "{} serializer '{}' is incompatible with deserializer '{}'",
                        slot, pair.serializer, pair.deserializer
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for a stream-stream join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Join window
    pub window: JoinWindowSpec,

    /// Join type (Inner, Left, Right, Full)
    #[serde(default)]
    pub join_type: JoinType,

    /// Declared key/value formats
    #[serde(default)]
    pub serde: SerdeConfig,
}

impl JoinConfig {
    pub fn new(window: JoinWindowSpec, join_type: JoinType) -> Self {
        Self {
            window,
            join_type,
            serde: SerdeConfig::default(),
        }
    }

    pub fn inner(window: JoinWindowSpec) -> Self {
        Self::new(window, JoinType::Inner)
    }

    pub fn left_outer(window: JoinWindowSpec) -> Self {
        Self::new(window, JoinType::LeftOuter)
    }

    pub fn right_outer(window: JoinWindowSpec) -> Self {
        Self::new(window, JoinType::RightOuter)
    }

    pub fn full_outer(window: JoinWindowSpec) -> Self {
        Self::new(window, JoinType::FullOuter)
    }

    /// Set the declared formats
    pub fn with_serde(mut self, serde: SerdeConfig) -> Self {
        self.serde = serde;
        self
    }

    /// Window name, used as the join's namespace
    pub fn name(&self) -> &str {
        &self.window.name
    }

    /// Check window bounds and format pairing
    pub fn validate(&self) -> JoinResult<()> {
        self.window.validate()?;
        self.serde.validate(self.name())
    }
}
