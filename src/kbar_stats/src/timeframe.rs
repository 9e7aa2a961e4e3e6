//! Roll-up frames: the target widths bars can be aggregated to.
//!
//! A [`RollupFrame`] is either a calendar day or a positive number of minutes
//! aligned to the trading session (see [`crate::bucket`]). It parses the same
//! short forms gm uses for its `tag` parameter.
//!
//! Typical usage:
//! ```
//! use kbar_stats::timeframe::RollupFrame;
//!
//! let frame: RollupFrame = "15m".parse().unwrap();
//! assert_eq!(frame.minutes(), Some(15));
//! assert_eq!("1h".parse::<RollupFrame>().unwrap().to_string(), "60m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use gm_ingestor::models::timeframe::{TimeFrame, TimeFrameUnit};

use crate::error::AggregateError;

/// Target width of a roll-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollupFrame {
    /// One bar per local calendar date, stamped at midnight.
    Daily,
    /// Session-aligned N-minute bars, stamped with their last input bar.
    Minutes(NonZeroU32),
}

impl RollupFrame {
    /// Width in minutes, `None` for [`RollupFrame::Daily`].
    pub fn minutes(&self) -> Option<u32> {
        match self {
            RollupFrame::Daily => None,
            RollupFrame::Minutes(n) => Some(n.get()),
        }
    }
}

impl fmt::Display for RollupFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollupFrame::Daily => f.write_str("1d"),
            RollupFrame::Minutes(n) => write!(f, "{n}m"),
        }
    }
}

impl FromStr for RollupFrame {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tf: TimeFrame = s.parse().map_err(|e| AggregateError::InvalidFrame {
            input: s.to_string(),
            reason: format!("{e}"),
        })?;
        RollupFrame::try_from(tf).map_err(|e| match e {
            AggregateError::InvalidFrame { reason, .. } => AggregateError::InvalidFrame {
                input: s.to_string(),
                reason,
            },
            other => other,
        })
    }
}

impl TryFrom<TimeFrame> for RollupFrame {
    type Error = AggregateError;

    fn try_from(tf: TimeFrame) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| AggregateError::InvalidFrame {
            input: tf.to_string(),
            reason: reason.to_string(),
        };
        match tf.unit {
            TimeFrameUnit::Day if tf.amount == 1 => Ok(RollupFrame::Daily),
            TimeFrameUnit::Day => Err(invalid("only single-day roll-ups are supported")),
            TimeFrameUnit::Minute | TimeFrameUnit::Hour => {
                let minutes = tf
                    .checked_minutes()
                    .ok_or_else(|| invalid("width overflows a minute count"))?;
                NonZeroU32::new(minutes)
                    .map(RollupFrame::Minutes)
                    .ok_or(AggregateError::ZeroInterval)
            }
        }
    }
}

impl From<RollupFrame> for TimeFrame {
    fn from(frame: RollupFrame) -> Self {
        match frame {
            RollupFrame::Daily => TimeFrame::ONE_DAY,
            RollupFrame::Minutes(n) => TimeFrame::new(n.get(), TimeFrameUnit::Minute),
        }
    }
}
