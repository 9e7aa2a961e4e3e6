use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
}

/// Bar interval as `amount × unit`. Rendered the way gm spells its `tag`
/// query parameter: `1m`, `5m`, `60m`, `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub const ONE_MINUTE: TimeFrame = TimeFrame::new(1, TimeFrameUnit::Minute);
    pub const ONE_DAY: TimeFrame = TimeFrame::new(1, TimeFrameUnit::Day);

    pub const fn new(amount: u32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    /// Length in minutes; a day counts as one 1440-minute calendar day.
    /// `None` when the length does not fit in a `u32`.
    pub fn checked_minutes(&self) -> Option<u32> {
        match self.unit {
            TimeFrameUnit::Minute => Some(self.amount),
            TimeFrameUnit::Hour => self.amount.checked_mul(60),
            TimeFrameUnit::Day => self.amount.checked_mul(1440),
        }
    }

    /// [`checked_minutes`](Self::checked_minutes), saturating at `u32::MAX`.
    /// Parsed frames never saturate.
    pub fn minutes(&self) -> u32 {
        self.checked_minutes().unwrap_or(u32::MAX)
    }

    /// The `tag` value the gm endpoints expect. Hours are expressed in minutes.
    pub fn gm_tag(&self) -> String {
        match self.unit {
            TimeFrameUnit::Day => format!("{}d", self.amount),
            _ => format!("{}m", self.minutes()),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = match self.unit {
            TimeFrameUnit::Minute => "m",
            TimeFrameUnit::Hour => "h",
            TimeFrameUnit::Day => "d",
        };
        write!(f, "{}{u}", self.amount)
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(last) = s.chars().last() else {
            return Err(TimeFrameError::InvalidInput {
                message: "empty timeframe".into(),
            });
        };
        let (digits, _) = s.split_at(s.len() - last.len_utf8());
        let unit = match last {
            'm' => TimeFrameUnit::Minute,
            'h' | 'H' => TimeFrameUnit::Hour,
            'd' | 'D' => TimeFrameUnit::Day,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("unknown unit {other:?} in {s:?}"),
                });
            }
        };
        let amount: u32 = digits.parse().map_err(|_| TimeFrameError::InvalidInput {
            message: format!("bad amount in {s:?}"),
        })?;
        if amount == 0 {
            return Err(TimeFrameError::InvalidAmount {
                unit,
                message: "amount must be > 0".into(),
            });
        }
        let tf = Self::new(amount, unit);
        if tf.checked_minutes().is_none() {
            return Err(TimeFrameError::InvalidAmount {
                unit,
                message: format!("{s:?} is longer than {} minutes", u32::MAX),
            });
        }
        Ok(tf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gm_tags() {
        assert_eq!("1m".parse::<TimeFrame>().unwrap(), TimeFrame::ONE_MINUTE);
        assert_eq!("1d".parse::<TimeFrame>().unwrap(), TimeFrame::ONE_DAY);
        assert_eq!(
            "2h".parse::<TimeFrame>().unwrap(),
            TimeFrame::new(2, TimeFrameUnit::Hour)
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            "".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidInput { .. })
        ));
        assert!(matches!(
            "0m".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidAmount { .. })
        ));
        assert!("5w".parse::<TimeFrame>().is_err());
        assert!(matches!(
            "99999999h".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidAmount {
                unit: TimeFrameUnit::Hour,
                ..
            })
        ));
        assert!(matches!(
            "4000000d".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidAmount { .. })
        ));
        assert!("xm".parse::<TimeFrame>().is_err());
    }

    #[test]
    fn gm_tag_uses_minutes_for_hours() {
        assert_eq!(TimeFrame::new(1, TimeFrameUnit::Hour).gm_tag(), "60m");
        assert_eq!(TimeFrame::new(15, TimeFrameUnit::Minute).gm_tag(), "15m");
        assert_eq!(TimeFrame::ONE_DAY.gm_tag(), "1d");
        assert_eq!(TimeFrame::new(2, TimeFrameUnit::Hour).to_string(), "2h");
    }

    #[test]
    fn oversized_lengths_do_not_overflow() {
        let tf = TimeFrame::new(u32::MAX, TimeFrameUnit::Hour);
        assert_eq!(tf.checked_minutes(), None);
        assert_eq!(tf.minutes(), u32::MAX);
        assert_eq!(
            "71582788h".parse::<TimeFrame>().unwrap().minutes(),
            71_582_788 * 60
        );
    }
}
