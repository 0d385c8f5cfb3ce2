//! Turning census-page markup into (total, client) node counts.
//!
//! Each site lays out its client table differently, so there is one
//! [`Extractor`] per markup shape. Both share the same rules: the row
//! labelled `Total` sets the total, rows whose label resolves to the
//! target client through the site's alias table add to the client count,
//! and a matched row whose number does not parse fails the extraction.

use crate::client::ClientKind;
use crate::error::{Error, Result};

pub mod pattern;
pub mod structured;

pub use pattern::PatternTextExtractor;
pub use structured::StructuredGroupExtractor;

pub trait Extractor: Send + Sync {
    fn extract(&self, markup: &str, client: ClientKind) -> Result<Extraction>;
}

/// Counts found on one page; `None` means the row was never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extraction {
    pub total: Option<u64>,
    pub client: Option<u64>,
}

/// A complete (total, client) pair from one view of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub total: u64,
    pub client: u64,
}

impl Extraction {
    /// Returns the pair only when both counts were found and are non-zero.
    pub fn complete(&self) -> Option<Tally> {
        match (self.total, self.client) {
            (Some(total), Some(client)) if total > 0 && client > 0 => Some(Tally { total, client }),
            _ => None,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.complete().is_none() && (self.total.is_some() || self.client.is_some())
    }

    fn add_client(&mut self, count: u64) -> Result<()> {
        let sum = self.client.unwrap_or(0).checked_add(count).ok_or_else(|| {
            Error::Invariant(format!("client count overflows adding {}", count))
        })?;
        self.client = Some(sum);
        Ok(())
    }

    fn check(self) -> Result<Self> {
        if let (Some(total), Some(client)) = (self.total, self.client) {
            if client > total {
                return Err(Error::Invariant(format!(
                    "client count {} exceeds total {}",
                    client, total
                )));
            }
        }
        Ok(self)
    }
}

fn parse_count(label: &str, raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    trimmed.parse::<u64>().map_err(|source| Error::Parse {
        label: label.trim().to_string(),
        raw: trimmed.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_requires_both_counts() {
        let full = Extraction { total: Some(500), client: Some(120) };
        assert_eq!(full.complete(), Some(Tally { total: 500, client: 120 }));

        let partial = Extraction { total: Some(500), client: None };
        assert!(partial.complete().is_none());
        assert!(partial.is_partial());

        let zero = Extraction { total: Some(500), client: Some(0) };
        assert!(zero.complete().is_none());

        assert!(!Extraction::default().is_partial());
    }

    #[test]
    fn client_above_total_is_rejected() {
        let bad = Extraction { total: Some(10), client: Some(11) };
        assert!(matches!(bad.check(), Err(Error::Invariant(_))));
    }

    #[test]
    fn summed_client_rows_must_not_overflow() {
        let mut found = Extraction::default();
        found.add_client(u64::MAX).unwrap();
        assert!(matches!(found.add_client(5), Err(Error::Invariant(_))));
        assert_eq!(found.client, Some(u64::MAX));
    }

    #[test]
    fn unparsable_count_is_an_error() {
        let err = parse_count("Total", "12k").unwrap_err();
        assert!(matches!(err, Error::Parse { ref raw, .. } if raw == "12k"));
        assert_eq!(parse_count("Geth", " 120 ").unwrap(), 120);
    }
}
