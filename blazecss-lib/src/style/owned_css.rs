// src/style/owned_css.rs: owned stylesheet values passed between the passes.
use std::fmt;

/// A fetched stylesheet: where it came from and its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheetSource {
    /// Absolute URL the text was fetched from.
    pub url: String,
    pub content: String,
}

impl StyleSheetSource {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        StyleSheetSource {
            url: url.into(),
            content: content.into(),
        }
    }
}

/// The final CSS handed to storage and spliced into the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizedStylesheet {
    pub css: String,
    /// Total size of the raw sources the CSS was built from.
    pub source_bytes: usize,
    pub source_count: usize,
}

impl OptimizedStylesheet {
    /// Fraction of the source bytes that was stripped, in `0.0..=1.0`.
    pub fn savings(&self) -> f64 {
        if self.source_bytes == 0 {
            return 0.0;
        }
        1.0 - (self.css.len() as f64 / self.source_bytes as f64).min(1.0)
    }
}

impl fmt::Display for OptimizedStylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stylesheet(s): {} -> {} bytes ({:.1}% removed)",
            self.source_count,
            self.source_bytes,
            self.css.len(),
            self.savings() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savings_and_display() {
        let sheet = OptimizedStylesheet {
            css: "a{b:c}".to_string(),
            source_bytes: 24,
            source_count: 2,
        };
        assert!((sheet.savings() - 0.75).abs() < f64::EPSILON);
        assert_eq!(sheet.to_string(), "2 stylesheet(s): 24 -> 6 bytes (75.0% removed)");
        assert_eq!(OptimizedStylesheet::default().savings(), 0.0);
    }
}
