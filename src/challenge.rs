/// Phrases that only appear on anti-automation interstitials.
pub const DEFAULT_MARKERS: &[&str] = &[
    "Just a moment",
    "Cloudflare",
    "Checking your browser before accessing",
    "cf_chl_opt",
];

/// Flags bodies that are a bot challenge rather than real content.
///
/// Matching is case-sensitive: a lowercase "cloudflare" inside an ordinary
/// page (a CDN hostname, say) must not cause the page to be thrown away.
#[derive(Debug, Clone)]
pub struct ChallengeDetector {
    markers: Vec<String>,
}

impl Default for ChallengeDetector {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ChallengeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds site-specific markers on top of the defaults.
    pub fn with_markers<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers.extend(
            extra
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty()),
        );
        self
    }

    pub fn is_challenge(&self, body: &str) -> bool {
        self.markers.iter().any(|m| body.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_interstitial() {
        let body = "<html><head><title>Just a moment...</title></head><body>Verifying</body></html>";
        assert!(ChallengeDetector::new().is_challenge(body));
    }

    #[test]
    fn detects_protecting_service_name() {
        let body = "<p>Performance &amp; security by Cloudflare</p>";
        assert!(ChallengeDetector::new().is_challenge(body));
    }

    #[test]
    fn ordinary_page_is_not_a_challenge() {
        let body = r#"<html><body><h2>Client Names</h2><span>Total (500)</span>
            <script src="https://cdnjs.cloudflare.com/x.js"></script></body></html>"#;
        assert!(!ChallengeDetector::new().is_challenge(body));
    }

    #[test]
    fn extra_markers_are_honoured() {
        let detector = ChallengeDetector::new().with_markers(["Access denied", ""]);
        assert!(detector.is_challenge("<h1>Access denied</h1>"));
        assert!(!detector.is_challenge("<h1>Welcome</h1>"));
    }
}
