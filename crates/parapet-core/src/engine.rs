//! The unified Parapet engine facade.
//!
//! This module provides the main entry point for the firewall. The
//! [`Parapet`] struct owns the scorer, both sliding-window trackers, the
//! ban list, and the toggle gate, and decides one request per call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parapet_audit::{
    AuditSink, ConfigStore, FeatureToggles, LogEntry, ACTION_ALLOWED, ACTION_BLOCKED, ATTACK_NONE,
};
use parapet_signatures::{normalize_pairs, normalize_text, AttackCategory, SignatureScorer};
use parapet_tracker::{spawn_sweeper, BanList, SlidingWindowTracker, TrackerConfig};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    config::ParapetConfig,
    gate::ConfigGate,
    request::{host_of, InboundRequest},
    verdict::{BlockReason, Verdict},
    Result,
};

/// Audit marker for requests allowed because evaluation itself failed.
pub const ATTACK_ENGINE_ERROR: &str = "EngineError";

/// The request decision engine.
///
/// Parapet runs eight ordered checks per request; the first decisive one
/// wins:
///
/// 1. Trusted source bypass (logged as allowed)
/// 2. Own-dashboard traffic bypass (not logged)
/// 3. Destination whitelist bypass (not logged)
/// 4. Active ban check
/// 5. Rate limiting (sliding window, static assets exempt)
/// 6. Sensitive-endpoint brute-force lockout
/// 7. Payload signature scoring (SQLi before XSS, deliberately)
/// 8. Default allow
///
/// # Security Model
///
/// - `decide` is infallible and never panics: internal evaluation errors
///   fail open to Allow with an `EngineError` audit marker. An origin
///   outage caused by its own shield is a worse failure than one missed
///   request.
/// - Toggles gate blocking only; scoring always runs, so sub-threshold
///   matches still surface as warnings.
/// - Every decision is `&self`; state lives in concurrent maps keyed by
///   source address, and unrelated sources never contend.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use parapet_audit::MemorySink;
/// use parapet_core::{InboundRequest, Parapet, ParapetConfig};
///
/// # fn main() -> Result<(), parapet_core::CoreError> {
/// let sink = Arc::new(MemorySink::new());
/// let engine = Parapet::new(ParapetConfig::default(), sink)?;
///
/// let request = InboundRequest::new("203.0.113.7", "GET", "http://shop.test/catalog");
/// assert!(engine.decide(&request).is_allowed());
///
/// let attack = InboundRequest::new("203.0.113.7", "GET", "http://shop.test/search")
///     .with_query(vec![("q".into(), "1 union select password from users".into())]);
/// assert!(engine.decide(&attack).is_blocked());
/// # Ok(())
/// # }
/// ```
pub struct Parapet {
    /// Configuration.
    config: ParapetConfig,

    /// Payload signature scorer.
    scorer: SignatureScorer,

    /// Request-rate tracker, keyed by source address.
    rate: Arc<SlidingWindowTracker>,

    /// Sensitive-endpoint attempt tracker, keyed by source address.
    brute: Arc<SlidingWindowTracker>,

    /// Active bans with trusted-source exemptions.
    bans: Arc<BanList>,

    /// Live protection toggles.
    gate: Arc<ConfigGate>,

    /// Audit trail destination.
    sink: Arc<dyn AuditSink>,

    decisions: AtomicU64,
    blocked: AtomicU64,
    allowed: AtomicU64,
    engine_errors: AtomicU64,
}

impl Parapet {
    /// Create a new engine with the given configuration and audit sink.
    ///
    /// Toggles start at the fail-closed defaults (everything on); bind a
    /// [`ConfigStore`] with [`spawn_refresher`] or push values through
    /// [`install_toggles`] to change them.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (zero windows, a
    /// zero ban duration, or a zero alert threshold).
    ///
    /// [`spawn_refresher`]: Parapet::spawn_refresher
    /// [`install_toggles`]: Parapet::install_toggles
    pub fn new(config: ParapetConfig, sink: Arc<dyn AuditSink>) -> Result<Self> {
        config.validate()?;

        let rate = Arc::new(SlidingWindowTracker::new(TrackerConfig::new(
            Duration::from_secs(config.rate.window_secs),
            config.rate.threshold,
        ))?);
        let brute = Arc::new(SlidingWindowTracker::new(TrackerConfig::new(
            Duration::from_secs(config.brute.window_secs),
            config.brute.threshold,
        ))?);
        let bans = Arc::new(BanList::new(
            Duration::from_secs(config.access.ban_secs),
            config.access.trusted.iter().cloned(),
        )?);

        info!(
            rate_threshold = config.rate.threshold,
            brute_threshold = config.brute.threshold,
            ban_secs = config.access.ban_secs,
            "parapet engine initialized"
        );

        Ok(Self {
            config,
            scorer: SignatureScorer::new(),
            rate,
            brute,
            bans,
            gate: Arc::new(ConfigGate::new(FeatureToggles::default())),
            sink,
            decisions: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            allowed: AtomicU64::new(0),
            engine_errors: AtomicU64::new(0),
        })
    }

    /// Decide one request against wall-clock time.
    pub fn decide(&self, request: &InboundRequest) -> Verdict {
        self.decide_at(request, Instant::now())
    }

    /// Decide one request against an injected clock.
    ///
    /// Window and ban arithmetic use `now`, which makes time-dependent
    /// behavior deterministic under test.
    pub fn decide_at(&self, request: &InboundRequest, now: Instant) -> Verdict {
        self.decisions.fetch_add(1, Ordering::Relaxed);

        let verdict = match self.evaluate(request, now) {
            Ok(verdict) => verdict,
            Err(e) => self.fail_open(request, &e),
        };

        if verdict.is_blocked() {
            self.blocked.fetch_add(1, Ordering::Relaxed);
        } else {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        }
        verdict
    }

    /// The ordered check pipeline.
    fn evaluate(&self, request: &InboundRequest, now: Instant) -> Result<Verdict> {
        let toggles = self.gate.snapshot();
        let ip = request.client_ip.as_str();

        // 1. Trusted sources skip everything, visibly.
        if self.bans.is_trusted(ip) {
            debug!(ip, "trusted source, allowing");
            self.log(request, ATTACK_NONE, ACTION_ALLOWED, "");
            return Ok(Verdict::allow());
        }

        // Hostname and endpoint matching is ASCII-case-insensitive.
        let url_lower = request.url.to_ascii_lowercase();

        // 2. The firewall's own operator surface. Inspecting or logging it
        // would fill the trail with dashboard polling.
        if self
            .config
            .access
            .dashboard_hosts
            .iter()
            .any(|h| url_lower.contains(h.as_str()))
        {
            return Ok(Verdict::allow());
        }

        // 3. Whitelisted destinations, exact host or subdomain.
        let host = host_of(&url_lower);
        if self
            .config
            .access
            .whitelist
            .iter()
            .any(|domain| host_matches(host, domain))
        {
            debug!(ip, host, "whitelisted destination, allowing");
            return Ok(Verdict::allow());
        }

        // 4. Sources serving a ban are refused outright.
        if self.bans.is_banned(ip, now) {
            warn!(ip, "banned source refused");
            self.log(request, BlockReason::IpBlocked.label(), ACTION_BLOCKED, "");
            return Ok(Verdict::block(BlockReason::IpBlocked));
        }

        // 5. Rate limiting. Static assets and non-page methods are exempt.
        if toggles.enable_rate_limit
            && !is_static_asset(request.path(), &self.config.rate.static_extensions)
            && matches!(request.method.as_str(), "GET" | "POST")
        {
            let status = self.rate.record_and_check(ip, now);
            if status.exceeded {
                warn!(ip, count = status.count, "rate limit tripped, banning");
                self.bans.ban(ip, now);
                self.log(request, BlockReason::RateLimit.label(), ACTION_BLOCKED, "");
                return Ok(Verdict::block(BlockReason::RateLimit));
            }
        }

        // 6. Brute-force lockout on credential endpoints.
        if toggles.enable_bruteforce
            && is_sensitive(&url_lower, &self.config.brute.sensitive_markers)
        {
            let status = self.brute.record_and_check(ip, now);
            if status.exceeded {
                warn!(ip, count = status.count, "brute force tripped, banning");
                self.bans.ban(ip, now);
                self.log(request, BlockReason::BruteForce.label(), ACTION_BLOCKED, "");
                return Ok(Verdict::block(BlockReason::BruteForce));
            }
        }

        // 7. Payload scoring. SQLi is checked before XSS; when a payload
        // carries both, it is reported as SQLi.
        let payload = assemble_payload(request);
        let score = self.scorer.score(&payload);

        if score.severity > 0 && score.severity < self.config.detection.alert_threshold {
            warn!(
                ip,
                severity = score.severity,
                "suspicious payload below alert threshold"
            );
        }

        if toggles.enable_sqli && score.has(AttackCategory::Sqli) {
            warn!(ip, severity = score.severity, "SQL injection blocked");
            self.log(request, BlockReason::Sqli.label(), ACTION_BLOCKED, &payload);
            return Ok(Verdict::block(BlockReason::Sqli));
        }
        if toggles.enable_xss && score.has(AttackCategory::Xss) {
            warn!(ip, severity = score.severity, "XSS attack blocked");
            self.log(request, BlockReason::Xss.label(), ACTION_BLOCKED, &payload);
            return Ok(Verdict::block(BlockReason::Xss));
        }

        // 8. Nothing fired.
        self.log(request, ATTACK_NONE, ACTION_ALLOWED, &payload);
        Ok(Verdict::allow())
    }

    /// Converts an internal evaluation failure into an observable allow.
    fn fail_open(&self, request: &InboundRequest, error: &crate::CoreError) -> Verdict {
        self.engine_errors.fetch_add(1, Ordering::Relaxed);
        error!(ip = %request.client_ip, error = %error,
            "evaluation failed, allowing request");
        self.log(request, ATTACK_ENGINE_ERROR, ACTION_ALLOWED, "");
        Verdict::allow()
    }

    fn log(&self, request: &InboundRequest, attack: &str, action: &str, payload: &str) {
        self.sink.record(LogEntry::new(
            &request.client_ip,
            &request.method,
            &request.url,
            attack,
            action,
            payload,
        ));
    }

    /// Current protection toggles.
    #[must_use]
    pub fn toggles(&self) -> FeatureToggles {
        self.gate.snapshot()
    }

    /// Replaces the protection toggles immediately.
    pub fn install_toggles(&self, toggles: FeatureToggles) {
        self.gate.install(toggles);
    }

    /// Counter snapshot for the operator surface.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            decisions: self.decisions.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            engine_errors: self.engine_errors.load(Ordering::Relaxed),
            sink_dropped: self.sink.dropped(),
            active_bans: self.bans.active_bans(),
            rate_keys: self.rate.tracked_keys(),
            brute_keys: self.brute.tracked_keys(),
            refresh_failures: self.gate.refresh_failures(),
        }
    }

    /// Spawns the idle-state sweeper for both trackers and the ban list.
    ///
    /// Optional hardening: decisions behave identically without it, the
    /// sweeper only bounds memory when many distinct sources go idle.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        spawn_sweeper(
            vec![Arc::clone(&self.rate), Arc::clone(&self.brute)],
            Arc::clone(&self.bans),
            every,
        )
    }

    /// Spawns the toggle refresher bound to `store`.
    pub fn spawn_refresher(&self, store: ConfigStore, every: Duration) -> JoinHandle<()> {
        Arc::clone(&self.gate).spawn_refresher(store, every)
    }
}

impl std::fmt::Debug for Parapet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parapet")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Counter snapshot across the engine's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    /// Requests decided.
    pub decisions: u64,
    /// Requests blocked.
    pub blocked: u64,
    /// Requests allowed, bypasses included.
    pub allowed: u64,
    /// Evaluations that failed open.
    pub engine_errors: u64,
    /// Audit records dropped by the sink.
    pub sink_dropped: u64,
    /// Sources currently serving a ban.
    pub active_bans: usize,
    /// Sources with live rate-window state.
    pub rate_keys: usize,
    /// Sources with live brute-force state.
    pub brute_keys: usize,
    /// Toggle refreshes that failed to read the store.
    pub refresh_failures: u64,
}

/// Exact-or-subdomain host comparison on a dot boundary.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

fn is_static_asset(path: &str, extensions: &[String]) -> bool {
    let lower = path.to_ascii_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
}

fn is_sensitive(url_lower: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| url_lower.contains(marker.as_str()))
}

/// Builds the scorable payload: normalized query pairs, then for POST a
/// space and the normalized form pairs, or the normalized raw body when
/// no form was parsed. A POST with neither contributes nothing.
fn assemble_payload(request: &InboundRequest) -> String {
    let mut payload = normalize_pairs(&request.query);
    if request.method == "POST" {
        if !request.form.is_empty() {
            payload.push(' ');
            payload.push_str(&normalize_pairs(&request.form));
        } else if let Some(body) = request.body.as_deref().filter(|b| !b.is_empty()) {
            payload.push(' ');
            payload.push_str(&normalize_text(body));
        }
    }
    payload
}
