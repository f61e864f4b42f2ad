//! Failure signatures: the ordered rule list the classifier evaluates.
//!
//! Rules are checked top to bottom and the first match wins, so a fault that
//! mentions both "401" and "connection reset" is `AUTH`. Message patterns are
//! case-insensitive and anchored on word boundaries where digits are involved
//! so that e.g. `4290` does not read as a 429.

use super::category::FailureCategory;
use super::raw::{FailureSource, RawFailure};
use regex::Regex;
use std::sync::LazyLock;

static AUTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(401|403)\b|unauthori[sz]ed|forbidden|invalid[ _-]?(api[ _-]?key|token|credentials?|x-api-key)|(expired|revoked)[ _-]?(token|credentials?|session)|token (has )?expired|authentication[ _-]?(failed|error|required)|not authenticated|oauth",
    )
    .expect("auth signature is a valid regex")
});

static RATE_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b429\b|rate[ _-]?limit|quota[ _-]?(exceeded|exhausted)|exceeded[^.]{0,40}quota|too many requests|overloaded|throttl",
    )
    .expect("rate-limit signature is a valid regex")
});

static NETWORK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)connection (refused|reset|closed|aborted)|econn(refused|reset|aborted)|\bdns\b|name resolution|could not resolve|failed to lookup address|network (is )?unreachable|host unreachable|broken pipe|transport closed|timed out|\btimeout\b|socket hang up",
    )
    .expect("network signature is a valid regex")
});

static DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)empty (response|body|result|output)|malformed|invalid json|unexpected end of|unexpected eof|parse error|failed to parse|could not parse|decode error|deseriali[sz]|no content",
    )
    .expect("data signature is a valid regex")
});

/// One classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Auth,
    RateLimit,
    Network,
    Data,
    ToolProvider,
}

impl Signature {
    /// Evaluation order. The engine deadline is handled before these rules
    /// and everything unmatched is `UNKNOWN`.
    pub const ORDER: [Signature; 5] = [
        Signature::Auth,
        Signature::RateLimit,
        Signature::Network,
        Signature::Data,
        Signature::ToolProvider,
    ];

    pub fn category(&self) -> FailureCategory {
        match self {
            Signature::Auth => FailureCategory::Auth,
            Signature::RateLimit => FailureCategory::RateLimit,
            Signature::Network => FailureCategory::Network,
            Signature::Data => FailureCategory::Data,
            Signature::ToolProvider => FailureCategory::ToolProvider,
        }
    }

    pub fn matches(&self, raw: &RawFailure) -> bool {
        let status = raw.status_code;
        let message = raw.message.as_str();
        match self {
            Signature::Auth => matches!(status, Some(401 | 403)) || AUTH.is_match(message),
            Signature::RateLimit => status == Some(429) || RATE_LIMIT.is_match(message),
            Signature::Network => {
                matches!(raw.source, FailureSource::Transport) || NETWORK.is_match(message)
            }
            Signature::Data => DATA.is_match(message),
            Signature::ToolProvider => matches!(raw.source, FailureSource::Tool { .. }),
        }
    }
}

/// First matching signature for a raw failure, if any.
pub fn first_match(raw: &RawFailure) -> Option<Signature> {
    Signature::ORDER.into_iter().find(|s| s.matches(raw))
}
