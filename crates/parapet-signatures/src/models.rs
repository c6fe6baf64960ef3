//! # Core Types for Payload Classification
//!
//! Data types shared by the normalizer, the scorer, and every downstream
//! consumer that needs to talk about attacks: the attack taxonomy and the
//! scoring result.
//!
//! ## Design Principles
//!
//! 1. **Closed taxonomy** - The signature table is fixed at startup, so the
//!    category enum is exhaustive and `Copy`.
//! 2. **Referential transparency** - [`ScoreResult`] is a pure projection of
//!    one payload string; scoring the same string twice yields the same
//!    result, with no hidden counters.
//! 3. **Serializable** - Types derive Serde traits so results can flow into
//!    audit records and CLI output unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attack families the signature table can classify.
///
/// | Variant | Attack class | Detection method |
/// |---------|--------------|------------------|
/// | `Sqli`  | SQL injection | Tautology/query-shape/comment signatures |
/// | `Xss`   | Cross-site scripting | Tag/handler/scheme signatures |
///
/// Ordering is meaningful: when one payload matches both families, SQL
/// injection takes precedence everywhere a single category must be chosen.
/// That precedence is a deliberate policy, not an artifact of iteration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackCategory {
    /// SQL injection: tautologies, `UNION SELECT`, DML/DDL verbs, comment
    /// terminators.
    Sqli,

    /// Cross-site scripting: `<script>` tags, inline event handlers,
    /// `javascript:` URIs.
    Xss,
}

impl AttackCategory {
    /// Short marker string used in audit records and block logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            AttackCategory::Sqli => "SQLi",
            AttackCategory::Xss => "XSS",
        }
    }

    /// Returns the OWASP Top 10 (2021) category this attack maps to.
    ///
    /// Both families fold into A03 since the 2021 revision merged
    /// cross-site scripting into the injection category.
    #[must_use]
    pub const fn owasp_category(&self) -> &'static str {
        match self {
            AttackCategory::Sqli => "A03:2021 Injection",
            AttackCategory::Xss => "A03:2021 Injection",
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of scoring one normalized payload.
///
/// `severity` accumulates a fixed weight per matching signature, so two
/// SQL signatures firing yields a higher severity than one even though the
/// category set stays `[Sqli]`. `categories` is deduplicated and preserves
/// first-match order, which (given the table layout) puts `Sqli` ahead of
/// `Xss` whenever both fire.
///
/// # Example
///
/// ```rust
/// use parapet_signatures::{AttackCategory, SignatureScorer};
///
/// let scorer = SignatureScorer::new();
/// let result = scorer.score("name=bob' union select password from users");
///
/// assert!(result.has(AttackCategory::Sqli));
/// assert_eq!(result.primary(), Some(AttackCategory::Sqli));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Accumulated severity across all matching signatures.
    pub severity: u32,
    /// Matched categories, deduplicated, in first-match order.
    pub categories: Vec<AttackCategory>,
}

impl ScoreResult {
    /// A result with no matches.
    #[must_use]
    pub const fn clean() -> Self {
        Self {
            severity: 0,
            categories: Vec::new(),
        }
    }

    /// Check whether nothing matched.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.categories.is_empty()
    }

    /// Check whether a specific category matched.
    #[inline]
    #[must_use]
    pub fn has(&self, category: AttackCategory) -> bool {
        self.categories.contains(&category)
    }

    /// The highest-precedence matched category, if any.
    #[inline]
    #[must_use]
    pub fn primary(&self) -> Option<AttackCategory> {
        self.categories.first().copied()
    }
}

impl Default for ScoreResult {
    fn default() -> Self {
        Self::clean()
    }
}
