use select::node::Node;
use select::predicate::Predicate;

/// Structural description of one element shape on a census page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupSelector {
    /// Element name, e.g. `h4`
    Tag(&'static str),

    /// One entry of the `class` attribute, e.g. `progress-group`
    Class(&'static str),

    /// `inner` nested somewhere under an element matching `outer`
    Within {
        outer: Box<MarkupSelector>,
        inner: Box<MarkupSelector>,
    },
}

impl MarkupSelector {
    pub fn within(outer: MarkupSelector, inner: MarkupSelector) -> Self {
        MarkupSelector::Within {
            outer: Box::new(outer),
            inner: Box::new(inner),
        }
    }

    /// Renders the selector as CSS, for log lines.
    pub fn to_css_string(&self) -> String {
        match self {
            MarkupSelector::Tag(tag) => tag.to_string(),
            MarkupSelector::Class(cls) => format!(".{}", cls),
            MarkupSelector::Within { outer, inner } => {
                format!("{} {}", outer.to_css_string(), inner.to_css_string())
            }
        }
    }

    /// First text node under `scope` matching this selector, trimmed.
    pub fn first_text(&self, scope: &Node) -> Option<String> {
        scope
            .find(self)
            .next()
            .map(|node| node.text().trim().to_string())
    }
}

impl Predicate for MarkupSelector {
    fn matches(&self, node: &Node) -> bool {
        match self {
            MarkupSelector::Tag(tag) => node.name() == Some(*tag),
            MarkupSelector::Class(cls) => node
                .attr("class")
                .map(|classes| classes.split_whitespace().any(|c| c == *cls))
                .unwrap_or(false),
            MarkupSelector::Within { outer, inner } => {
                if !inner.matches(node) {
                    return false;
                }
                let mut current = node.parent();
                while let Some(parent) = current {
                    if outer.matches(&parent) {
                        return true;
                    }
                    current = parent.parent();
                }
                false
            }
        }
    }
}

impl<'a> Predicate for &'a MarkupSelector {
    fn matches(&self, node: &Node) -> bool {
        (*self).matches(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use select::document::Document;

    const PAGE: &str = r#"
        <div class="card">
          <div class="progress-group">
            <div class="progress-group-header"><div>geth</div><div class="ms-auto fw-semibold">42</div></div>
          </div>
        </div>
        <span class="fw-semibold">7</span>"#;

    #[test]
    fn class_matches_one_of_many() {
        let doc = Document::from(PAGE);
        let hits: Vec<_> = doc.find(&MarkupSelector::Class("fw-semibold")).collect();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn within_restricts_to_descendants() {
        let doc = Document::from(PAGE);
        let selector = MarkupSelector::within(
            MarkupSelector::Class("progress-group-header"),
            MarkupSelector::Class("fw-semibold"),
        );
        let texts: Vec<_> = doc.find(&selector).map(|n| n.text()).collect();
        assert_eq!(texts, vec!["42".to_string()]);
        assert_eq!(selector.to_css_string(), ".progress-group-header .fw-semibold");
    }

    #[test]
    fn first_text_takes_document_order() {
        let doc = Document::from(PAGE);
        let root = doc.find(&MarkupSelector::Tag("body")).next().unwrap();
        let count = MarkupSelector::Class("fw-semibold");
        assert_eq!(count.first_text(&root).as_deref(), Some("42"));
        assert_eq!(MarkupSelector::Tag("span").first_text(&root).as_deref(), Some("7"));
    }
}
