//! Integration tests for provider failures
//!
//! A failing provider must never abort a lookup: its failure is recorded in
//! the source list and fusion continues with whatever else answered.

mod helpers;

use std::time::{Duration, Instant};

use geo_precision::config::{MAX_PROVIDER_BODY_BYTES, MAX_TEXT_FIELD_CHARS};
use geo_precision::error_handling::ProviderFailure;
use geo_precision::{
    AccuracyLabel, ConfidenceTier, EstimateStatus, LookupError, ProviderKind, ProviderSpec,
};
use helpers::{
    engine_for, engine_for_kinds, mock_spec, mount_fix, mount_response, provider_body,
    test_tunables, Fix, HTTP_KINDS, TEST_IP,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::{MockServer, ResponseTemplate};

fn fix_near(i: usize) -> Fix {
    Fix::new(-23.5505 + 0.002 * i as f64, -46.6333, "BR")
}

#[tokio::test]
async fn test_all_providers_failing_is_unavailable() {
    let server = MockServer::start().await;
    for kind in HTTP_KINDS {
        mount_response(&server, kind, ResponseTemplate::new(500)).await;
    }
    let engine = engine_for_kinds(&server, &HTTP_KINDS);

    let estimate = engine.locate(TEST_IP).await.expect("lookup should not error");

    assert_eq!(estimate.status, EstimateStatus::Unavailable);
    assert_eq!(estimate.lat, None);
    assert_eq!(estimate.lon, None);
    assert_eq!(estimate.sources_queried, 5);
    assert_eq!(estimate.sources_succeeded, 0);
    assert_eq!(estimate.confidence_tier, ConfidenceTier::SingleSource);
    assert_eq!(estimate.accuracy_label, AccuracyLabel::Indisponivel);
    assert_eq!(estimate.max_radius_m, 0.0);
    assert_eq!(estimate.source_list.len(), 5);
    for entry in &estimate.source_list {
        assert!(!entry.available);
        assert_eq!(entry.error, Some(ProviderFailure::HttpStatus));
    }
}

#[tokio::test]
async fn test_slow_provider_times_out_without_blocking_others() {
    let server = MockServer::start().await;
    for (i, kind) in HTTP_KINDS[..3].iter().enumerate() {
        mount_fix(&server, *kind, &fix_near(i)).await;
    }
    mount_response(
        &server,
        ProviderKind::Ipinfo,
        ResponseTemplate::new(200)
            .set_body_json(provider_body(ProviderKind::Ipinfo, &fix_near(3)))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let mut slow = mock_spec(&server, ProviderKind::Ipinfo);
    slow.timeout_ms = Some(200);
    let mut specs: Vec<ProviderSpec> = HTTP_KINDS[..3]
        .iter()
        .map(|k| mock_spec(&server, *k))
        .collect();
    specs.push(slow);
    let engine = engine_for(&specs, test_tunables());

    let start = Instant::now();
    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(estimate.sources_queried, 4);
    assert_eq!(estimate.sources_succeeded, 3);
    assert_eq!(estimate.sources_agree, 3);
    let ipinfo = estimate.source("ipinfo").expect("ipinfo is listed");
    assert!(!ipinfo.available);
    assert_eq!(ipinfo.error, Some(ProviderFailure::Timeout));
}

#[tokio::test]
async fn test_deadline_cuts_off_stragglers() {
    let server = MockServer::start().await;
    mount_fix(&server, ProviderKind::IpApi, &fix_near(0)).await;
    mount_fix(&server, ProviderKind::Ipwhois, &fix_near(1)).await;
    mount_response(
        &server,
        ProviderKind::Freeipapi,
        ResponseTemplate::new(200)
            .set_body_json(provider_body(ProviderKind::Freeipapi, &fix_near(2)))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let specs: Vec<ProviderSpec> = [ProviderKind::IpApi, ProviderKind::Ipwhois, ProviderKind::Freeipapi]
        .iter()
        .map(|k| mock_spec(&server, *k))
        .collect();
    let mut tunables = test_tunables();
    tunables.provider_timeout = Duration::from_secs(10);
    tunables.deadline = Some(Duration::from_millis(500));
    let engine = engine_for(&specs, tunables);

    let start = Instant::now();
    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(estimate.sources_succeeded, 2);
    assert_eq!(estimate.sources_agree, 2);
    assert_eq!(estimate.confidence_tier, ConfidenceTier::Media);
    let straggler = estimate.source("freeipapi").expect("freeipapi is listed");
    assert_eq!(straggler.error, Some(ProviderFailure::DeadlineExceeded));
}

#[tokio::test]
async fn test_malformed_coordinates_are_excluded() {
    let server = MockServer::start().await;
    mount_fix(&server, ProviderKind::IpApi, &fix_near(0)).await;
    mount_fix(&server, ProviderKind::Ipwhois, &fix_near(1)).await;
    mount_response(
        &server,
        ProviderKind::IpapiCo,
        ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 123.4,
            "longitude": -46.6,
            "country_code": "BR"
        })),
    )
    .await;
    // freeipapi answers (0, 0) for addresses it does not know
    mount_response(
        &server,
        ProviderKind::Freeipapi,
        ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 0.0,
            "longitude": 0.0,
            "countryCode": "-"
        })),
    )
    .await;
    let engine = engine_for_kinds(
        &server,
        &[
            ProviderKind::IpApi,
            ProviderKind::Ipwhois,
            ProviderKind::IpapiCo,
            ProviderKind::Freeipapi,
        ],
    );

    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    assert_eq!(estimate.sources_succeeded, 2);
    assert_eq!(estimate.sources_agree, 2);
    for source in ["ipapi-co", "freeipapi"] {
        let entry = estimate.source(source).expect("source is listed");
        assert!(!entry.available, "{} should be unavailable", source);
        assert_eq!(entry.error, Some(ProviderFailure::MalformedCoordinates));
        assert_eq!(entry.lat, None);
    }
}

#[tokio::test]
async fn test_rate_limited_provider_is_rejected() {
    let server = MockServer::start().await;
    mount_fix(&server, ProviderKind::IpApi, &fix_near(0)).await;
    mount_response(&server, ProviderKind::Ipwhois, ResponseTemplate::new(429)).await;
    let engine = engine_for_kinds(&server, &[ProviderKind::IpApi, ProviderKind::Ipwhois]);

    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    assert_eq!(estimate.sources_succeeded, 1);
    assert_eq!(estimate.accuracy_label, AccuracyLabel::FonteUnica);
    let limited = estimate.source("ipwhois").expect("ipwhois is listed");
    assert_eq!(limited.error, Some(ProviderFailure::Rejected));
}

#[tokio::test]
async fn test_provider_declining_the_address_is_rejected() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        ProviderKind::IpApi,
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "reserved range"
        })),
    )
    .await;
    let engine = engine_for_kinds(&server, &[ProviderKind::IpApi]);

    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    assert_eq!(estimate.status, EstimateStatus::Unavailable);
    let entry = estimate.source("ip-api").expect("ip-api is listed");
    assert_eq!(entry.error, Some(ProviderFailure::Rejected));
    assert!(entry
        .error_detail
        .as_deref()
        .is_some_and(|d| d.contains("reserved range")));
}

#[tokio::test]
async fn test_garbage_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        ProviderKind::Ipwhois,
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;
    let engine = engine_for_kinds(&server, &[ProviderKind::Ipwhois]);

    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    let entry = estimate.source("ipwhois").expect("ipwhois is listed");
    assert_eq!(entry.error, Some(ProviderFailure::Decode));
}

#[tokio::test]
async fn test_cancellation_abandons_the_lookup() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        ProviderKind::IpApi,
        ResponseTemplate::new(200)
            .set_body_json(provider_body(ProviderKind::IpApi, &fix_near(0)))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    let mut tunables = test_tunables();
    tunables.provider_timeout = Duration::from_secs(10);
    let engine = engine_for(&[mock_spec(&server, ProviderKind::IpApi)], tunables);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = engine.locate_with_cancel(TEST_IP, &cancel).await;

    assert!(matches!(result, Err(LookupError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_invalid_ip_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let engine = engine_for_kinds(&server, &HTTP_KINDS);

    let result = engine.locate("not-an-ip").await;

    assert!(matches!(result, Err(LookupError::InvalidIp(_))));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let server = MockServer::start().await;
    mount_fix(&server, ProviderKind::IpApi, &fix_near(0)).await;
    let mut body = provider_body(ProviderKind::Ipwhois, &fix_near(1));
    body["city"] = json!("x".repeat(MAX_PROVIDER_BODY_BYTES + 1));
    mount_response(
        &server,
        ProviderKind::Ipwhois,
        ResponseTemplate::new(200).set_body_json(body),
    )
    .await;
    let engine = engine_for_kinds(&server, &[ProviderKind::IpApi, ProviderKind::Ipwhois]);

    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    let entry = estimate.source("ipwhois").expect("ipwhois is listed");
    assert!(!entry.available);
    assert_eq!(entry.error, Some(ProviderFailure::Decode));
    assert!(entry
        .error_detail
        .as_deref()
        .is_some_and(|d| d.contains("exceeds")));
    assert!(estimate.source("ip-api").is_some_and(|e| e.available));
}

#[tokio::test]
async fn test_long_text_fields_are_truncated() {
    let server = MockServer::start().await;
    let mut body = provider_body(ProviderKind::IpApi, &fix_near(0));
    body["city"] = json!("Sao Paulo ".repeat(1_000));
    mount_response(
        &server,
        ProviderKind::IpApi,
        ResponseTemplate::new(200).set_body_json(body),
    )
    .await;
    let engine = engine_for_kinds(&server, &[ProviderKind::IpApi]);

    let estimate = engine.locate(TEST_IP).await.expect("lookup should succeed");

    let entry = estimate.source("ip-api").expect("ip-api is listed");
    assert!(entry.available);
    let city = entry.city.as_deref().expect("city is kept");
    assert_eq!(city.chars().count(), MAX_TEXT_FIELD_CHARS);
}
