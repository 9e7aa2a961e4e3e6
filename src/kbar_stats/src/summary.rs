//! Per-day indicator summaries and their flat record form.
//!
//! Indicators come in three groups, selected by name with [`IndicatorSet::parse`]:
//!
//! - price: `hjj`, `pvj` (also emits the daily `open..volume`)
//! - session volumes: `v931`, `v932`, `v935`, `v940`, `v150`
//! - cost basis: `vmed`, `cbj`, `cb1`, `cb2`, `nup`, `ndown`
//!
//! Naming any member selects its whole group. Only selected groups are computed.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use gm_ingestor::{
    config::MarketCfg,
    models::{Record, bar::Bar},
    tz,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cost_basis::{CostBasis, DEFAULT_CUTOFF, cost_basis},
    markers::{SessionVolumes, session_volumes},
    price::{PriceWeights, golden_price, volume_weighted_price},
    rollup::{RollupStamp, daily_groups, rollup},
    session::SessionCalendar,
};

const PRICE_NAMES: [&str; 2] = ["hjj", "pvj"];
const VOLUME_NAMES: [&str; 5] = ["v931", "v932", "v935", "v940", "v150"];
const COST_NAMES: [&str; 6] = ["vmed", "cbj", "cb1", "cb2", "nup", "ndown"];

/// Which indicator groups to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// Daily bar plus `hjj` and `pvj`.
    pub price: bool,
    /// Opening and closing volume markers.
    pub volumes: bool,
    /// Cost-basis figures.
    pub cost_basis: bool,
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl IndicatorSet {
    /// Every group.
    pub const ALL: IndicatorSet = IndicatorSet {
        price: true,
        volumes: true,
        cost_basis: true,
    };

    /// No group.
    pub const NONE: IndicatorSet = IndicatorSet {
        price: false,
        volumes: false,
        cost_basis: false,
    };

    /// Parses a comma-separated list of indicator names.
    ///
    /// An empty list selects everything; unknown names are ignored.
    pub fn parse(list: &str) -> Self {
        if list.trim().is_empty() {
            return Self::ALL;
        }
        let mut set = Self::NONE;
        for name in list.split(',').map(str::trim) {
            if PRICE_NAMES.contains(&name) {
                set.price = true;
            } else if VOLUME_NAMES.contains(&name) {
                set.volumes = true;
            } else if COST_NAMES.contains(&name) {
                set.cost_basis = true;
            } else {
                tracing::debug!(name, "ignoring unknown indicator");
            }
        }
        set
    }

    /// True when no group is selected.
    pub fn is_empty(&self) -> bool {
        !(self.price || self.volumes || self.cost_basis)
    }
}

/// How [`DailySummary::to_record`] renders the `timestamp` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `YYYY-MM-DD` in the market zone.
    #[default]
    DateText,
    /// Unix milliseconds of local midnight.
    EpochMillis,
}

/// Daily bar and its golden-price figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Midnight-stamped daily roll-up.
    pub bar: Bar,
    /// Canonical golden price of the daily bar.
    pub hjj: f64,
    /// Volume-weighted golden price of the intraday bars.
    pub pvj: f64,
}

/// Selected indicators of one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Local trading date.
    pub date: NaiveDate,
    /// Local midnight of `date`.
    pub timestamp: DateTime<Utc>,
    /// Present when the price group was selected.
    pub price: Option<PriceSummary>,
    /// Present when the session-volume group was selected.
    pub volumes: Option<SessionVolumes>,
    /// Present when the cost-basis group was selected.
    pub cost: Option<CostBasis>,
}

/// Builds [`DailySummary`] values for one session and cost-basis cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summarizer {
    /// Trading hours and zone.
    pub session: SessionCalendar,
    /// Split between `cb1` and `cb2`.
    pub cutoff: NaiveTime,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self {
            session: SessionCalendar::default(),
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl Summarizer {
    /// Zone and cutoff from `[market]`.
    pub fn from_market_cfg(cfg: &MarketCfg) -> anyhow::Result<Self> {
        Ok(Self {
            session: SessionCalendar::from_market_cfg(cfg)?,
            cutoff: cfg.cutoff()?,
        })
    }

    /// Summary of one day's intraday bars, dated by the first bar.
    pub fn day(&self, day_bars: &[Bar], set: IndicatorSet) -> Option<DailySummary> {
        let first = day_bars.first()?;
        let session = &self.session;
        let date = session.local_date(first.timestamp);

        let price = if set.price {
            rollup(day_bars, RollupStamp::DayStart, session).map(|bar| PriceSummary {
                hjj: golden_price(&bar, &PriceWeights::CANONICAL),
                pvj: volume_weighted_price(day_bars, &PriceWeights::CANONICAL),
                bar,
            })
        } else {
            None
        };
        let volumes = if set.volumes {
            session_volumes(day_bars, session)
        } else {
            None
        };
        let cost = if set.cost_basis {
            cost_basis(day_bars, self.cutoff, session)
        } else {
            None
        };

        Some(DailySummary {
            date,
            timestamp: session.day_start(date),
            price,
            volumes,
            cost,
        })
    }

    /// One summary per local date, ascending.
    pub fn daily(&self, bars: &[Bar], set: IndicatorSet) -> Vec<DailySummary> {
        let out: Vec<DailySummary> = daily_groups(bars, &self.session)
            .iter()
            .filter_map(|day| self.day(day, set))
            .collect();
        tracing::debug!(bars = bars.len(), days = out.len(), ?set, "daily summaries");
        out
    }
}

/// [`Summarizer::daily`] with the default 10:00:00 cutoff.
pub fn summaries_daily(
    bars: &[Bar],
    set: IndicatorSet,
    session: &SessionCalendar,
) -> Vec<DailySummary> {
    Summarizer {
        session: *session,
        cutoff: DEFAULT_CUTOFF,
    }
    .daily(bars, set)
}

impl DailySummary {
    /// [`Summarizer::day`] with the default 10:00:00 cutoff.
    pub fn from_bars(
        day_bars: &[Bar],
        set: IndicatorSet,
        session: &SessionCalendar,
    ) -> Option<Self> {
        Summarizer {
            session: *session,
            cutoff: DEFAULT_CUTOFF,
        }
        .day(day_bars, set)
    }

    /// The daily bar, if the price group was computed.
    pub fn to_bar(&self) -> Option<Bar> {
        self.price.as_ref().map(|p| p.bar.clone())
    }

    /// The volume markers, if computed.
    pub fn session_volumes(&self) -> Option<SessionVolumes> {
        self.volumes
    }

    /// The cost-basis figures, if computed.
    pub fn cost_basis(&self) -> Option<CostBasis> {
        self.cost
    }

    /// Flat record of the groups that are both selected by `set` and computed.
    ///
    /// `timestamp` leads whenever any group is emitted; an empty selection
    /// gives an empty record.
    pub fn to_record(&self, set: IndicatorSet, format: TimestampFormat, tz: Tz) -> Record {
        let price = self.price.as_ref().filter(|_| set.price);
        let volumes = self.volumes.filter(|_| set.volumes);
        let cost = self.cost.filter(|_| set.cost_basis);

        let mut rec = Record::new();
        if price.is_none() && volumes.is_none() && cost.is_none() {
            return rec;
        }
        let ts = match format {
            TimestampFormat::DateText => {
                Value::from(tz::format_local(self.timestamp, tz, "%Y-%m-%d"))
            }
            TimestampFormat::EpochMillis => Value::from(tz::to_epoch_millis(self.timestamp)),
        };
        rec.insert("timestamp".into(), ts);

        let mut put = |k: &str, v: Value| {
            rec.insert(k.to_string(), v);
        };
        if let Some(p) = price {
            put("open", p.bar.open.into());
            put("high", p.bar.high.into());
            put("low", p.bar.low.into());
            put("close", p.bar.close.into());
            put("volume", p.bar.volume.into());
            put("hjj", p.hjj.into());
            put("pvj", p.pvj.into());
        }
        if let Some(v) = volumes {
            put("v931", v.v931.into());
            put("v932", v.v932.into());
            put("v935", v.v935.into());
            put("v940", v.v940.into());
            put("v150", v.v150.into());
        }
        if let Some(c) = cost {
            put("vmed", c.vmed.into());
            put("cbj", c.cbj.into());
            put("cb1", c.cb1.into());
            put("cb2", c.cb2.into());
            put("nup", c.nup.into());
            put("ndown", c.ndown.into());
        }
        rec
    }
}
