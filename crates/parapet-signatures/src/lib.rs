//! # Parapet Signatures - Payload Inspection Layer
//!
//! Deterministic, signature-based classification of HTTP request payloads.
//! This crate is the stateless half of the Parapet decision engine: it turns
//! raw query strings and request bodies into a canonical form and scores them
//! against a fixed table of attack signatures.
//!
//! ## Purpose
//!
//! Two capabilities, both pure functions over strings:
//!
//! 1. **Payload Normalization** - Collapses query parameters, form fields, and
//!    raw bodies into one lowercase, percent-decoded string so signatures
//!    cannot be dodged with `%27` or case games.
//!
//! 2. **Signature Scoring** - Matches the normalized payload against compiled
//!    SQL-injection and cross-site-scripting signatures, accumulating a
//!    severity score and the set of matched attack categories.
//!
//! ## Threat Model
//!
//! | Threat | Example | Signature family |
//! |--------|---------|------------------|
//! | SQL tautology | `' OR '1'='1`, `OR 1=1` | Boolean/quoted tautologies |
//! | SQL data lifting | `UNION SELECT`, `SELECT ... FROM` | Query-shape probes |
//! | SQL data tampering | `INSERT INTO`, `DROP TABLE` | DML/DDL verbs |
//! | SQL comment tricks | `--;`, `#` | Comment terminators |
//! | Script injection | `<script>`, `</script>` | Tag signatures |
//! | Handler injection | `onerror=`, `onload=` | Event-handler attributes |
//! | URI scheme abuse | `javascript:` | Scheme signatures |
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 PAYLOAD INSPECTION                     │
//! ├────────────────────────────────────────────────────────┤
//! │                                                        │
//! │  query pairs ─┐                                        │
//! │  form pairs ──┼──► NORMALIZER ──► "id=1' or '1'='1"    │
//! │  raw body  ───┘    lowercase +                         │
//! │                    percent-decode                      │
//! │                         │                              │
//! │                         ▼                              │
//! │                 SIGNATURE SCORER                       │
//! │                 13 compiled regexes                    │
//! │                         │                              │
//! │                         ▼                              │
//! │                 ┌──────────────┐                       │
//! │                 │ ScoreResult  │                       │
//! │                 │ severity: 6  │                       │
//! │                 │ [SQLi]       │                       │
//! │                 └──────────────┘                       │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//!
//! - **OWASP Top 10 (2021), A03: Injection** - taxonomy covering both the SQL
//!   and script signature families.
//!   <https://owasp.org/Top10/A03_2021-Injection/>
//! - **CAPEC-66** - SQL Injection attack pattern.
//!   <https://capec.mitre.org/data/definitions/66.html>
//! - **CAPEC-63** - Cross-Site Scripting attack pattern.
//!   <https://capec.mitre.org/data/definitions/63.html>
//!
//! ## Usage
//!
//! ```rust
//! use parapet_signatures::{normalize_text, AttackCategory, SignatureScorer};
//!
//! let scorer = SignatureScorer::new();
//! let payload = normalize_text("q=1%27%20or%20%271%27=%271");
//! let result = scorer.score(&payload);
//!
//! assert!(result.has(AttackCategory::Sqli));
//! assert!(result.severity >= 3);
//! ```

pub mod models;
pub mod normalize;
pub mod scorer;

pub use models::{AttackCategory, ScoreResult};
pub use normalize::{normalize_pairs, normalize_text};
pub use scorer::{SignatureScorer, MATCH_WEIGHT};
