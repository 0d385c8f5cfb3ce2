use super::{parse_count, Extraction, Extractor};
use crate::client::{is_total_label, label_matches, AliasTable, ClientKind, ETHERNODES_ALIASES};
use crate::error::Result;
use crate::selector::MarkupSelector;
use select::document::Document;

/// Reads repeated label/count groups that follow a marker heading.
pub struct StructuredGroupExtractor {
    heading: MarkupSelector,
    marker: &'static str,
    group: MarkupSelector,
    label: MarkupSelector,
    count: MarkupSelector,
    aliases: AliasTable,
}

impl StructuredGroupExtractor {
    /// Layout used by ethernodes.org: one `.progress-group` per client,
    /// with the name in the header's first `div` and the count in bold.
    pub fn ethernodes() -> Self {
        let header = MarkupSelector::Class("progress-group-header");
        Self {
            heading: MarkupSelector::Tag("h4"),
            marker: "Execution Layer Clients",
            group: MarkupSelector::Class("progress-group"),
            label: MarkupSelector::within(header.clone(), MarkupSelector::Tag("div")),
            count: MarkupSelector::within(header, MarkupSelector::Class("fw-semibold")),
            aliases: ETHERNODES_ALIASES,
        }
    }
}

impl Extractor for StructuredGroupExtractor {
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

            let groups: Vec<_> = container.find(&self.group).collect();
            log::debug!(
                "Found '{}' section with {} {} groups",
                self.marker,
                groups.len(),
                self.group.to_css_string()
            );

            for group in groups {
                let Some(label) = self.label.first_text(&group) else {
                    continue;
                };
                let relevant = is_total_label(&label) || label_matches(self.aliases, &label, client);
                if !relevant {
                    continue;
                }
                let Some(raw) = self.count.first_text(&group) else {
                    log::debug!("Group '{}' has no {} element", label, self.count.to_css_string());
                    continue;
                };

                let count = parse_count(&label, &raw)?;
                if is_total_label(&label) {
                    found.total = Some(count);
                } else {
                    log::debug!("Found client {} with {} nodes", label, count);
                    found.add_client(count)?;
                }
            }
        }

        found.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn group(label: &str, count: &str) -> String {
        format!(
            r#"<div class="progress-group">
                 <div class="progress-group-header">
                   <div>{}</div>
                   <div class="ms-auto fw-semibold">{}</div>
                 </div>
                 <div class="progress"><div class="progress-bar"></div></div>
               </div>"#,
            label, count
        )
    }

    fn page(groups: &[(&str, &str)]) -> String {
        let body: String = groups.iter().map(|(l, c)| group(l, c)).collect();
        format!(
            "<html><body><div class=\"card-body\"><h4>Execution Layer Clients</h4>{}</div>\
             <div class=\"card-body\"><h4>Consensus Layer Clients</h4>{}</div></body></html>",
            body,
            group("Total", "10000")
        )
    }

    #[test]
    fn reads_total_and_client_groups() {
        let html = page(&[("Total", "6000"), ("nethermind", "1500"), ("besu", "400")]);
        let found = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Nethermind)
            .unwrap();
        assert_eq!(found, Extraction { total: Some(6000), client: Some(1500) });
    }

    #[test]
    fn geth_spellings_are_summed() {
        let html = page(&[("Total", "6000"), ("geth", "3000"), ("go-ethereum", "200")]);
        let found = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Geth)
            .unwrap();
        assert_eq!(found.client, Some(3200));
    }

    #[test]
    fn case_variation_matches() {
        let html = page(&[("TOTAL", "6000"), ("Geth", "3000"), ("gethereum", "5")]);
        let found = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Geth)
            .unwrap();
        assert_eq!(found.complete().map(|t| (t.total, t.client)), Some((6000, 3000)));
    }

    #[test]
    fn bad_count_on_target_client_fails() {
        let html = page(&[("Total", "6000"), ("reth", "1,2")]);
        let err = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Reth)
            .unwrap_err();
        assert!(matches!(err, Error::Parse { ref label, .. } if label == "reth"));
    }

    #[test]
    fn other_sections_are_not_read() {
        let html = page(&[("erigon", "700")]);
        let found = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Erigon)
            .unwrap();
        assert_eq!(found.total, None);
        assert_eq!(found.client, Some(700));
    }

    #[test]
    fn overflowing_alias_sum_is_rejected() {
        let max = u64::MAX.to_string();
        let html = page(&[("Total", max.as_str()), ("geth", max.as_str()), ("go-ethereum", "5")]);
        let err = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Geth)
            .unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn client_exceeding_total_is_rejected() {
        let html = page(&[("Total", "10"), ("besu", "11")]);
        let err = StructuredGroupExtractor::ethernodes()
            .extract(&html, ClientKind::Besu)
            .unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }
}
