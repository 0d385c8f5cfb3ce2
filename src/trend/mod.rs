//! Turns a history of measurements into a readable trend report.

use crate::error::{Error, Result};
use crate::model::ClientData;
use std::fmt;

pub mod chart;

pub use chart::ChartSpec;

/// Direction of a period-over-period change in node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Shrinking(i64),
    Growing(i64),
    NotMoving,
}

impl Trend {
    pub fn classify(delta: i64) -> Self {
        match delta {
            d if d < 0 => Trend::Shrinking(d),
            d if d > 0 => Trend::Growing(d),
            _ => Trend::NotMoving,
        }
    }

    /// Fails when the change does not fit a signed 64-bit delta.
    pub fn between(previous: u64, current: u64) -> Result<Self> {
        let delta = i128::from(current) - i128::from(previous);
        let delta = i64::try_from(delta).map_err(|_| {
            Error::Invariant(format!("delta from {} to {} is out of range", previous, current))
        })?;
        Ok(Self::classify(delta))
    }

    pub fn delta(&self) -> i64 {
        match self {
            Trend::Shrinking(d) | Trend::Growing(d) => *d,
            Trend::NotMoving => 0,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Shrinking(d) => write!(f, "*shrinking* ( *{}* :fire_extinguisher:)", d),
            Trend::Growing(d) => write!(f, "*growing* ( *+{}* :muscle:)", d),
            Trend::NotMoving => write!(f, "*not moving* ( *0* :no_mouth:)"),
        }
    }
}

/// Share of the network held by one measurement, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shares {
    pub of_network: f64,
    pub of_synced: f64,
    pub synced_ratio: f64,
}

impl Shares {
    pub fn of(data: &ClientData) -> Result<Self> {
        Ok(Self {
            of_network: percent(data.client_total(), data.total(), "total")?,
            of_synced: percent(data.client_synced(), data.total_synced(), "total synced")?,
            synced_ratio: percent(data.client_synced(), data.client_total(), "client total")?,
        })
    }
}

fn percent(part: u64, whole: u64, name: &'static str) -> Result<f64> {
    if whole == 0 {
        return Err(Error::ZeroDenominator(name));
    }
    Ok(part as f64 * 100.0 / whole as f64)
}

#[derive(Debug, Clone)]
pub struct Report {
    pub text: String,
    pub chart: ChartSpec,
}

/// Builds the report text and chart for `history`, newest entry last.
///
/// History is re-sorted by creation time, so callers may pass it in the
/// order the store returned it.
pub fn compose(source_name: &str, history: &[ClientData]) -> Result<Report> {
    let mut history = history.to_vec();
    history.sort_by_key(|d| d.created_at());

    let Some(current) = history.last() else {
        return Err(Error::EmptyHistory);
    };
    let shares = Shares::of(current)?;

    let mut text = format!(
        "Today there are *{}* | *{:.2}%* {} nodes from which *{}* | *{:.2}%* are synced(*{:.2}%*)!",
        current.client_total(),
        shares.of_network,
        current.client(),
        current.client_synced(),
        shares.of_synced,
        shares.synced_ratio,
    );

    if history.len() > 1 {
        let previous = &history[history.len() - 2];
        let all = Trend::between(previous.client_total(), current.client_total())?;
        let synced = Trend::between(previous.client_synced(), current.client_synced())?;
        text.push('\n');
        text.push_str(&format!(
            "The number of all nodes is {} and synced nodes are {}",
            all, synced
        ));
    }

    Ok(Report {
        text,
        chart: ChartSpec::from_history(source_name, &history),
    })
}
