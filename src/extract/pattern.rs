use super::{parse_count, Extraction, Extractor};
use crate::client::{is_total_label, label_matches, AliasTable, ClientKind, ETHERNETS_ALIASES};
use crate::error::{Error, Result};
use crate::selector::MarkupSelector;
use regex::Regex;
use select::document::Document;

/// Reads `<label> (<count>)` text entries listed under a marker heading.
pub struct PatternTextExtractor {
    heading: MarkupSelector,
    marker: &'static str,
    entry: MarkupSelector,
    pattern: Regex,
    aliases: AliasTable,
}

impl PatternTextExtractor {
    pub fn new(
        heading: MarkupSelector,
        marker: &'static str,
        entry: MarkupSelector,
        aliases: AliasTable,
    ) -> Result<Self> {
        let pattern = Regex::new(r"([\w.-]+)\s+\(([^()]*)\)")
            .map_err(|e| Error::Config(format!("entry pattern: {}", e)))?;
        Ok(Self {
            heading,
            marker,
            entry,
            pattern,
            aliases,
        })
    }

    /// Layout used by ethernets.io.
    pub fn ethernets() -> Result<Self> {
        Self::new(
            MarkupSelector::Tag("h2"),
            "Client Names",
            MarkupSelector::Tag("span"),
            ETHERNETS_ALIASES,
        )
    }
}

impl Extractor for PatternTextExtractor {
    fn extract(&self, markup: &str, client: ClientKind) -> Result<Extraction> {
        let doc = Document::from(markup);
        let mut found = Extraction::default();

        for heading in doc.find(&self.heading) {
            if !heading.text().contains(self.marker) {
                continue;
            }
            let Some(container) = heading.parent() else {
                continue;
            };
            log::debug!("Found '{}' section", self.marker);

            for entry in container.find(&self.entry) {
                let text = entry.text();
                let Some(caps) = self.pattern.captures(&text) else {
                    continue;
                };
                let label = &caps[1];
                let raw = &caps[2];
                log::debug!("Found entry {} ({})", label, raw);

                if is_total_label(label) {
                    found.total = Some(parse_count(label, raw)?);
                } else if label_matches(self.aliases, label, client) {
                    found.add_client(parse_count(label, raw)?)?;
                }
            }
        }

        found.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(entries: &[&str]) -> String {
        let spans: String = entries
            .iter()
            .map(|e| format!("<span class=\"badge\">{}</span>", e))
            .collect();
        format!(
            "<html><body><div class=\"col\"><h2>Client Names</h2>{}</div>\
             <div><h2>Countries</h2><span>Total (99999)</span></div></body></html>",
            spans
        )
    }

    #[test]
    fn reads_total_and_client() {
        let extractor = PatternTextExtractor::ethernets().unwrap();
        let html = page(&["Total (500)", "Geth (120)", "Nethermind (80)"]);

        let found = extractor.extract(&html, ClientKind::Nethermind).unwrap();
        assert_eq!(found, Extraction { total: Some(500), client: Some(80) });

        let found = extractor.extract(&html, ClientKind::Geth).unwrap();
        assert_eq!(found.complete().map(|t| t.client), Some(120));
    }

    #[test]
    fn ignores_entries_outside_marker_section() {
        let extractor = PatternTextExtractor::ethernets().unwrap();
        let html = page(&["Reth (3)"]);
        let found = extractor.extract(&html, ClientKind::Reth).unwrap();
        assert_eq!(found.total, None);
        assert_eq!(found.client, Some(3));
        assert!(found.is_partial());
    }

    #[test]
    fn missing_client_stays_unresolved() {
        let extractor = PatternTextExtractor::ethernets().unwrap();
        let html = page(&["Total (500)", "Geth (120)"]);
        let found = extractor.extract(&html, ClientKind::Erigon).unwrap();
        assert_eq!(found.client, None);
        assert!(found.complete().is_none());
    }

    #[test]
    fn bad_number_on_matched_label_fails() {
        let extractor = PatternTextExtractor::ethernets().unwrap();
        let html = page(&["Total (5x0)", "Geth (120)"]);
        let err = extractor.extract(&html, ClientKind::Geth).unwrap_err();
        assert!(matches!(err, Error::Parse { ref label, .. } if label == "Total"));
    }

    #[test]
    fn bad_number_on_other_label_is_ignored() {
        let extractor = PatternTextExtractor::ethernets().unwrap();
        let html = page(&["Total (500)", "Besu (n/a)", "Geth (120)"]);
        let found = extractor.extract(&html, ClientKind::Geth).unwrap();
        assert_eq!(found.complete().map(|t| t.total), Some(500));
    }

    #[test]
    fn page_without_marker_yields_nothing() {
        let extractor = PatternTextExtractor::ethernets().unwrap();
        let found = extractor
            .extract("<html><body><p>maintenance</p></body></html>", ClientKind::Geth)
            .unwrap();
        assert_eq!(found, Extraction::default());
    }
}
