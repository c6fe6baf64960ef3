//! Signature scorer
//!
//! Matches normalized payloads against the fixed SQL-injection and
//! cross-site-scripting signature table, accumulating severity per match.

use regex::Regex;

use crate::models::{AttackCategory, ScoreResult};

/// Severity contributed by each matching signature.
pub const MATCH_WEIGHT: u32 = 3;

/// One compiled attack signature.
struct Signature {
    pattern: Regex,
    category: AttackCategory,
    description: &'static str,
}

/// The signature scorer - compiled once, shared everywhere.
///
/// Scoring is a pure function of the payload: no I/O, no interior
/// mutability, safe to call from any number of threads without
/// synchronization.
pub struct SignatureScorer {
    signatures: Vec<Signature>,
}

impl SignatureScorer {
    /// Compile the built-in signature table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signatures: Self::build_signatures(),
        }
    }

    /// Build the fixed signature table.
    ///
    /// SQL signatures come first; that ordering is what gives SQLi
    /// precedence in [`ScoreResult::primary`] when both families fire.
    fn build_signatures() -> Vec<Signature> {
        vec![
            // SQL injection: tautologies
            Signature {
                pattern: Regex::new(r"(?i)(\bor\b|\band\b)\s+\d+=\d+").unwrap(),
                category: AttackCategory::Sqli,
                description: "Numeric tautology (OR 1=1)",
            },
            Signature {
                pattern: Regex::new(r"(?i)'\s*or\s*'1'='1").unwrap(),
                category: AttackCategory::Sqli,
                description: "Quoted tautology ('1'='1)",
            },
            // SQL injection: query-shape probes
            Signature {
                pattern: Regex::new(r"(?i)union\s+select").unwrap(),
                category: AttackCategory::Sqli,
                description: "UNION SELECT data lifting",
            },
            Signature {
                pattern: Regex::new(r"(?i)select\s+.*\s+from").unwrap(),
                category: AttackCategory::Sqli,
                description: "SELECT ... FROM probe",
            },
            // SQL injection: DML/DDL verbs
            Signature {
                pattern: Regex::new(r"(?i)insert\s+into").unwrap(),
                category: AttackCategory::Sqli,
                description: "INSERT INTO tampering",
            },
            Signature {
                pattern: Regex::new(r"(?i)drop\s+table").unwrap(),
                category: AttackCategory::Sqli,
                description: "DROP TABLE destruction",
            },
            // SQL injection: comment terminators
            Signature {
                pattern: Regex::new(r"(?i)--;").unwrap(),
                category: AttackCategory::Sqli,
                description: "Dash comment terminator",
            },
            Signature {
                pattern: Regex::new(r"(?i)#").unwrap(),
                category: AttackCategory::Sqli,
                description: "Hash comment terminator",
            },
            // Cross-site scripting: tags
            Signature {
                pattern: Regex::new(r"(?i)<script.*?>").unwrap(),
                category: AttackCategory::Xss,
                description: "Script tag open",
            },
            Signature {
                pattern: Regex::new(r"(?i)</script>").unwrap(),
                category: AttackCategory::Xss,
                description: "Script tag close",
            },
            // Cross-site scripting: event handlers
            Signature {
                pattern: Regex::new(r"(?i)onerror\s*=").unwrap(),
                category: AttackCategory::Xss,
                description: "onerror handler",
            },
            Signature {
                pattern: Regex::new(r"(?i)onload\s*=").unwrap(),
                category: AttackCategory::Xss,
                description: "onload handler",
            },
            // Cross-site scripting: URI scheme
            Signature {
                pattern: Regex::new(r"(?i)javascript:").unwrap(),
                category: AttackCategory::Xss,
                description: "javascript: URI",
            },
        ]
    }

    /// Score a payload against every signature.
    ///
    /// Each matching signature adds [`MATCH_WEIGHT`] to severity and its
    /// category to the (deduplicated) category set. Matching is a substring
    /// search: a signature anywhere in the payload counts.
    #[must_use]
    pub fn score(&self, payload: &str) -> ScoreResult {
        let mut severity = 0;
        let mut categories: Vec<AttackCategory> = Vec::new();

        for sig in &self.signatures {
            if sig.pattern.is_match(payload) {
                severity += MATCH_WEIGHT;
                if !categories.contains(&sig.category) {
                    categories.push(sig.category);
                }
            }
        }

        ScoreResult {
            severity,
            categories,
        }
    }

    /// Human-readable descriptions of every signature that matches.
    ///
    /// Used for operator-facing diagnostics (`parapet scan`); the decision
    /// path only needs [`Self::score`].
    #[must_use]
    pub fn explain(&self, payload: &str) -> Vec<&'static str> {
        self.signatures
            .iter()
            .filter(|sig| sig.pattern.is_match(payload))
            .map(|sig| sig.description)
            .collect()
    }

    /// Number of compiled signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// True when the table is empty (never, for the built-in table).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureScorer {
    fn default() -> Self {
        Self::new()
    }
}
