//! Verdict types for request decisions.

use serde::{Deserialize, Serialize};

/// The final decision for one inbound request.
///
/// The engine returns one of two verdicts:
/// - `Allow`: forward the request upstream
/// - `Block`: answer with a 403 and the reason's body text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Request passed every check. Forward it.
    Allow,

    /// Request tripped a protection. Do not forward.
    Block {
        /// The protection that fired.
        reason: BlockReason,
    },
}

impl Verdict {
    /// Create an Allow verdict.
    pub fn allow() -> Self {
        Self::Allow
    }

    /// Create a Block verdict with the given reason.
    pub fn block(reason: BlockReason) -> Self {
        Self::Block { reason }
    }

    /// Returns true if this is an Allow verdict.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns true if this is a Block verdict.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// HTTP status the transport should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Allow => 200,
            Self::Block { reason } => reason.status(),
        }
    }

    /// The reason, when blocked.
    pub fn reason(&self) -> Option<BlockReason> {
        match self {
            Self::Allow => None,
            Self::Block { reason } => Some(*reason),
        }
    }
}

/// Why a request was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    /// Source address is serving an active ban.
    IpBlocked,

    /// Source exceeded the request-rate window.
    RateLimit,

    /// Source hammered a sensitive endpoint.
    BruteForce,

    /// Payload matched SQL injection signatures.
    Sqli,

    /// Payload matched cross-site scripting signatures.
    Xss,
}

impl BlockReason {
    /// Attack marker written into the audit trail for this reason.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::IpBlocked => "IPBlocked",
            Self::RateLimit => "RateLimit",
            Self::BruteForce => "BruteForce",
            Self::Sqli => "SQLi",
            Self::Xss => "XSS",
        }
    }

    /// Plaintext body for the block response.
    #[must_use]
    pub const fn body(&self) -> &'static str {
        match self {
            Self::IpBlocked => "IP blocked",
            Self::RateLimit => "Rate limit exceeded",
            Self::BruteForce => "Brute force detected",
            Self::Sqli => "SQL injection blocked",
            Self::Xss => "XSS attack blocked",
        }
    }

    /// HTTP status for the block response. Every reason maps to 403; the
    /// client learns that it was refused, not how the refusal was decided.
    #[must_use]
    pub const fn status(&self) -> u16 {
        403
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.body())
    }
}
