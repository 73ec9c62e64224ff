use std::sync::LazyLock;

use regex::Regex;

use crate::constants::NO_LEAKS_PHRASE;

// A count of 1 or more followed by the word "errors"; "0 errors" must not
// match, so the leading digit excludes zero.
static ERROR_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([1-9]\d*)\s+errors").expect("error-count regex"));

/// What the checker's textual report said, scraped once at construction.
/// The raw text is kept verbatim for logging.
#[derive(Clone, Debug)]
pub struct MemcheckFindings {
    raw: String,
    error_count: Option<u64>,
    heap_clean: bool,
}

impl MemcheckFindings {
    pub fn parse(report: String) -> Self {
        let error_count = ERROR_COUNT_RE
            .captures(&report)
            .and_then(|captures| captures[1].parse().ok());
        let heap_clean = report.contains(NO_LEAKS_PHRASE);
        Self {
            raw: report,
            error_count,
            heap_clean,
        }
    }

    /// Number of reported errors, when the report names one or more.
    pub fn error_count(&self) -> Option<u64> {
        self.error_count
    }

    pub fn reported_errors(&self) -> bool {
        self.error_count.is_some()
    }

    /// True only when the report carries the explicit all-freed confirmation.
    pub fn no_leaks_confirmed(&self) -> bool {
        self.heap_clean
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}
