//! Typed control signals parsed from model output.
//!
//! The critic and the verifier answer in free text. Parsing happens here,
//! once, and anything that is not the exact approval token counts against
//! the answer.

use serde::Serialize;

/// Critic outcome for one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriticVerdict {
    /// The critic replied with the bare `OK` token.
    Approved,
    /// Anything else; the trimmed reply is the critique.
    Revise(String),
}

impl CriticVerdict {
    /// Approval requires the trimmed reply to equal `OK`, ignoring case.
    pub fn parse(raw: &str) -> Self {
        let reply = raw.trim();
        if reply.eq_ignore_ascii_case("OK") {
            CriticVerdict::Approved
        } else {
            CriticVerdict::Revise(reply.to_string())
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, CriticVerdict::Approved)
    }
}

/// Verifier outcome for a final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportVerdict {
    Supported,
    Unsupported,
}

impl SupportVerdict {
    /// Support requires the trimmed reply to start with `YES`, ignoring case.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().to_uppercase().starts_with("YES") {
            SupportVerdict::Supported
        } else {
            SupportVerdict::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, SupportVerdict::Supported)
    }
}
