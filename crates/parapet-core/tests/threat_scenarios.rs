//! # Threat Scenario Tests
//!
//! End-to-end decisions through the engine facade: attack payloads, volume
//! attacks, lockouts, bans, and the bypass tiers.
//!
//! ## Scenarios Covered
//!
//! 1. **Payload Attacks**: SQL injection and XSS, encoded and plain
//! 2. **Volume Attacks**: Rate limiting, brute force, and the bans they install
//! 3. **Bypass Tiers**: Trusted sources, whitelisted destinations, own traffic
//! 4. **False Positive Resistance**: Legitimate requests pass untouched

use std::sync::Arc;
use std::time::{Duration, Instant};

use parapet_audit::{MemorySink, ACTION_ALLOWED, ACTION_BLOCKED, ATTACK_NONE};
use parapet_core::{BlockReason, FeatureToggles, InboundRequest, Parapet, ParapetConfig};

fn engine() -> (Parapet, Arc<MemorySink>) {
    engine_with(ParapetConfig::default())
}

fn engine_with(config: ParapetConfig) -> (Parapet, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let engine = Parapet::new(config, sink.clone()).unwrap();
    (engine, sink)
}

fn get(ip: &str, url: &str) -> InboundRequest {
    InboundRequest::new(ip, "GET", url)
}

fn search(ip: &str, q: &str) -> InboundRequest {
    get(ip, "http://shop.test/search").with_query(vec![("q".into(), q.into())])
}

// =============================================================================
// PAYLOAD ATTACK SCENARIOS
// =============================================================================

#[test]
fn test_scenario_union_select_blocked() {
    let (engine, sink) = engine();

    let verdict = engine.decide(&search("203.0.113.7", "1 union select password from users"));

    assert_eq!(verdict.reason(), Some(BlockReason::Sqli));
    assert_eq!(verdict.status(), 403);
    assert_eq!(verdict.reason().unwrap().body(), "SQL injection blocked");

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].attack, "SQLi");
    assert_eq!(entries[0].action, ACTION_BLOCKED);
}

#[test]
fn test_scenario_classic_tautology_blocked_below_alert_threshold() {
    let (engine, _sink) = engine();

    // A single signature match scores below the alert threshold but still
    // blocks: category presence governs, the threshold only grades.
    let verdict = engine.decide(&search("203.0.113.7", "' or '1'='1"));
    assert_eq!(verdict.reason(), Some(BlockReason::Sqli));
}

#[test]
fn test_scenario_script_tag_blocked_as_xss() {
    let (engine, sink) = engine();

    let verdict = engine.decide(&search("203.0.113.7", "<script>alert(1)</script>"));

    assert_eq!(verdict.reason(), Some(BlockReason::Xss));
    assert_eq!(verdict.reason().unwrap().body(), "XSS attack blocked");
    assert_eq!(sink.entries()[0].attack, "XSS");
}

#[test]
fn test_scenario_combined_payload_reports_sqli() {
    let (engine, _sink) = engine();

    // Both categories match; SQLi precedence is deliberate.
    let verdict = engine.decide(&search(
        "203.0.113.7",
        "<script>fetch('/x')</script> union select 1",
    ));
    assert_eq!(verdict.reason(), Some(BlockReason::Sqli));
}

#[test]
fn test_scenario_percent_encoded_payload_decoded() {
    let (engine, _sink) = engine();

    let verdict = engine.decide(&search("203.0.113.7", "%27%20or%20%271%27=%271"));
    assert_eq!(verdict.reason(), Some(BlockReason::Sqli));
}

#[test]
fn test_scenario_post_body_scored() {
    let (engine, sink) = engine();

    let request = InboundRequest::new("203.0.113.7", "POST", "http://shop.test/comment")
        .with_body("<IMG onerror=alert(1) src=x>");
    let verdict = engine.decide(&request);

    assert_eq!(verdict.reason(), Some(BlockReason::Xss));
    assert!(sink.entries()[0].payload.contains("onerror"));
}

#[test]
fn test_scenario_disabled_toggle_allows_payload() {
    let (engine, sink) = engine();

    let mut toggles = FeatureToggles::default();
    toggles.enable_xss = false;
    engine.install_toggles(toggles);

    let verdict = engine.decide(&search("203.0.113.7", "<script>alert(1)</script>"));
    assert!(verdict.is_allowed());
    // The allow is still on the record, without an attack marker.
    assert_eq!(sink.entries()[0].attack, ATTACK_NONE);
    assert_eq!(sink.entries()[0].action, ACTION_ALLOWED);
}

#[test]
fn test_scenario_sql_toggle_off_xss_still_blocks() {
    let (engine, _sink) = engine();

    let mut toggles = FeatureToggles::default();
    toggles.enable_sqli = false;
    engine.install_toggles(toggles);

    let verdict = engine.decide(&search(
        "203.0.113.7",
        "<script>x</script> union select 1",
    ));
    assert_eq!(verdict.reason(), Some(BlockReason::Xss));
}

// =============================================================================
// VOLUME ATTACK SCENARIOS
// =============================================================================

#[test]
fn test_scenario_rate_limit_then_ban() {
    let (engine, sink) = engine();
    let now = Instant::now();

    // Threshold 50: the window tolerates 50, the 51st trips.
    for i in 0..50 {
        let verdict = engine.decide_at(&get("198.51.100.9", "http://shop.test/catalog"), now);
        assert!(verdict.is_allowed(), "request {} should pass", i + 1);
    }

    let tripped = engine.decide_at(&get("198.51.100.9", "http://shop.test/catalog"), now);
    assert_eq!(tripped.reason(), Some(BlockReason::RateLimit));

    // The trip installs a ban; the next request is refused before any
    // window arithmetic runs.
    let refused = engine.decide_at(
        &get("198.51.100.9", "http://shop.test/catalog"),
        now + Duration::from_secs(1),
    );
    assert_eq!(refused.reason(), Some(BlockReason::IpBlocked));
    assert_eq!(refused.reason().unwrap().body(), "IP blocked");

    let entries = sink.entries();
    let ban_entry = entries.last().unwrap();
    assert_eq!(ban_entry.attack, "IPBlocked");
    assert_eq!(ban_entry.action, ACTION_BLOCKED);
    assert_eq!(ban_entry.payload, "");
}

#[test]
fn test_scenario_ban_expires_after_duration() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    for _ in 0..51 {
        engine.decide_at(&get("198.51.100.9", "http://shop.test/catalog"), now);
    }
    assert_eq!(engine.status().active_bans, 1);

    // 120 s ban: still refused just inside, clean again just past it.
    let inside = engine.decide_at(
        &get("198.51.100.9", "http://shop.test/catalog"),
        now + Duration::from_secs(119),
    );
    assert_eq!(inside.reason(), Some(BlockReason::IpBlocked));

    let after = engine.decide_at(
        &get("198.51.100.9", "http://shop.test/catalog"),
        now + Duration::from_secs(121),
    );
    assert!(after.is_allowed());
}

#[test]
fn test_scenario_static_assets_exempt_from_rate_limit() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    for _ in 0..80 {
        let verdict = engine.decide_at(
            &get("198.51.100.9", "http://shop.test/static/app.css?v=7"),
            now,
        );
        assert!(verdict.is_allowed());
    }
    assert_eq!(engine.status().rate_keys, 0);
}

#[test]
fn test_scenario_query_slash_is_not_a_static_asset() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    // `/a.css` lives in the query, not the path; the rate window counts
    // these like any page request.
    for _ in 0..50 {
        assert!(engine
            .decide_at(&get("198.51.100.9", "http://shop.test?f=/a.css"), now)
            .is_allowed());
    }
    let tripped = engine.decide_at(&get("198.51.100.9", "http://shop.test?f=/a.css"), now);
    assert_eq!(tripped.reason(), Some(BlockReason::RateLimit));
}

#[test]
fn test_scenario_non_page_methods_exempt_from_rate_limit() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    for _ in 0..80 {
        let request = InboundRequest::new("198.51.100.9", "HEAD", "http://shop.test/catalog");
        assert!(engine.decide_at(&request, now).is_allowed());
    }
}

#[test]
fn test_scenario_brute_force_lockout_on_login() {
    let (engine, sink) = engine();
    let now = Instant::now();

    let attempt = || {
        InboundRequest::new("198.51.100.9", "POST", "http://shop.test/login")
            .with_form(vec![("user".into(), "admin".into()), ("pass".into(), "guess".into())])
    };

    // Threshold 5: five attempts pass, the sixth locks out.
    for i in 0..5 {
        let verdict = engine.decide_at(&attempt(), now + Duration::from_secs(i));
        assert!(verdict.is_allowed(), "attempt {} should pass", i + 1);
    }

    let locked = engine.decide_at(&attempt(), now + Duration::from_secs(5));
    assert_eq!(locked.reason(), Some(BlockReason::BruteForce));
    assert_eq!(locked.reason().unwrap().body(), "Brute force detected");
    assert_eq!(sink.entries().last().unwrap().attack, "BruteForce");

    // The ban reaches every endpoint, not just the credential one.
    let elsewhere = engine.decide_at(
        &get("198.51.100.9", "http://shop.test/catalog"),
        now + Duration::from_secs(6),
    );
    assert_eq!(elsewhere.reason(), Some(BlockReason::IpBlocked));
}

#[test]
fn test_scenario_sensitive_markers_case_insensitive() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    for _ in 0..5 {
        engine.decide_at(&get("198.51.100.9", "http://shop.test/Auth/token"), now);
    }
    let locked = engine.decide_at(&get("198.51.100.9", "http://shop.test/Auth/token"), now);
    assert_eq!(locked.reason(), Some(BlockReason::BruteForce));
}

#[test]
fn test_scenario_unrelated_paths_do_not_feed_lockout() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    for _ in 0..20 {
        assert!(engine
            .decide_at(&get("198.51.100.9", "http://shop.test/catalog"), now)
            .is_allowed());
    }
    assert_eq!(engine.status().brute_keys, 0);
}

#[test]
fn test_scenario_brute_force_toggle_off() {
    let (engine, _sink) = engine();
    let now = Instant::now();

    let mut toggles = FeatureToggles::default();
    toggles.enable_bruteforce = false;
    engine.install_toggles(toggles);

    for _ in 0..20 {
        let verdict = engine.decide_at(&get("198.51.100.9", "http://shop.test/login"), now);
        assert!(verdict.is_allowed());
    }
}

// =============================================================================
// BYPASS TIER SCENARIOS
// =============================================================================

#[test]
fn test_scenario_trusted_source_bypasses_everything() {
    let (engine, sink) = engine();
    let now = Instant::now();

    // Attack payload, flood volume, credential endpoint: all ignored.
    for _ in 0..100 {
        let request = InboundRequest::new("127.0.0.1", "POST", "http://shop.test/login")
            .with_form(vec![("q".into(), "' or '1'='1".into())]);
        assert!(engine.decide_at(&request, now).is_allowed());
    }
    assert_eq!(engine.status().active_bans, 0);

    let entries = sink.entries();
    assert_eq!(entries.len(), 100);
    assert!(entries.iter().all(|e| e.attack == ATTACK_NONE));
    assert!(entries.iter().all(|e| e.action == ACTION_ALLOWED));
    assert!(entries.iter().all(|e| e.payload.is_empty()));
}

#[test]
fn test_scenario_whitelisted_destination_not_logged() {
    let (engine, sink) = engine();

    let verdict = engine.decide(&get(
        "198.51.100.9",
        "https://fonts.googleapis.com/css2?family=Inter",
    ));
    assert!(verdict.is_allowed());
    assert!(sink.is_empty());
}

#[test]
fn test_scenario_whitelist_subdomain_matches() {
    let (engine, sink) = engine();

    assert!(engine
        .decide(&get("198.51.100.9", "https://assets.unpkg.com/lib.js"))
        .is_allowed());
    assert!(sink.is_empty());
}

#[test]
fn test_scenario_uppercase_whitelisted_destination_still_bypasses() {
    let (engine, sink) = engine();
    let now = Instant::now();

    // Hostname case must not defeat the bypass: no log entries, and the
    // volume never reaches the rate tracker or the ban list.
    for _ in 0..60 {
        let verdict = engine.decide_at(
            &get("198.51.100.9", "http://FONTS.GOOGLEAPIS.COM/css?family=Inter"),
            now,
        );
        assert!(verdict.is_allowed());
    }
    assert!(sink.is_empty());
    assert_eq!(engine.status().active_bans, 0);
    assert_eq!(engine.status().rate_keys, 0);
}

#[test]
fn test_scenario_lookalike_domain_not_whitelisted() {
    let (engine, sink) = engine();

    // Suffix matches only on a dot boundary.
    let verdict = engine.decide(&search("198.51.100.9", "x"));
    assert!(verdict.is_allowed());
    let before = sink.len();

    engine.decide(&get("198.51.100.9", "https://evilunpkg.com/lib.js"));
    assert_eq!(sink.len(), before + 1, "lookalike must be inspected and logged");
}

#[test]
fn test_scenario_own_dashboard_traffic_invisible() {
    let (engine, sink) = engine();

    let verdict = engine.decide(&get(
        "198.51.100.9",
        "http://127.0.0.1:5000/api/stats",
    ));
    assert!(verdict.is_allowed());
    assert!(sink.is_empty());
}

#[test]
fn test_scenario_uppercase_dashboard_traffic_invisible() {
    let (engine, sink) = engine();

    let verdict = engine.decide(&get("198.51.100.9", "HTTP://LOCALHOST:5000/api/stats"));
    assert!(verdict.is_allowed());
    assert!(sink.is_empty());
}

// =============================================================================
// FALSE POSITIVE RESISTANCE
// =============================================================================

#[test]
fn test_scenario_normal_browsing_untouched() {
    let (engine, sink) = engine();

    let requests = vec![
        get("198.51.100.9", "http://shop.test/"),
        get("198.51.100.9", "http://shop.test/catalog?page=2&sort=price"),
        InboundRequest::new("198.51.100.9", "POST", "http://shop.test/cart")
            .with_form(vec![("item".into(), "union jack flag".into())]),
        get("198.51.100.9", "http://shop.test/article?title=select+committee+report"),
    ];

    for request in &requests {
        assert!(
            engine.decide(request).is_allowed(),
            "false positive on {:?}",
            request.url
        );
    }
    assert!(sink.entries().iter().all(|e| e.action == ACTION_ALLOWED));
}
