//! Error types of the aggregation and reshaping code.

use thiserror::Error;

/// Errors from aggregation and indicator parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregateError {
    /// N-minute roll-ups need a positive width.
    #[error("roll-up interval must be at least one minute")]
    ZeroInterval,

    /// The checked tick roll-up was given nothing.
    #[error("no ticks to aggregate")]
    EmptyTicks,

    /// Every tick had a non-positive price or a negative volume.
    #[error("none of the {dropped} ticks had a positive price and non-negative volume")]
    NoValidTicks {
        /// How many ticks were discarded.
        dropped: usize,
    },

    /// Price weights must be finite, non-negative and sum to more than zero.
    #[error("invalid price weights: {reason}")]
    InvalidWeights {
        /// What was wrong with them.
        reason: String,
    },

    /// A roll-up frame string that is neither `Nm`, `Nh` nor `1d`.
    #[error("invalid roll-up frame {input:?}: {reason}")]
    InvalidFrame {
        /// The rejected text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors from the timestamp-keyed JSON helpers.
#[derive(Debug, Error)]
pub enum KeyedError {
    /// A custom key format that strftime cannot render.
    #[error("invalid key format {0:?}")]
    BadFormat(String),

    /// Encoding or decoding the JSON document failed.
    #[error("keyed json: {0}")]
    Json(#[from] serde_json::Error),

    /// The looked-up key is not in the document.
    #[error("no bar keyed {0:?}")]
    MissingKey(String),
}
