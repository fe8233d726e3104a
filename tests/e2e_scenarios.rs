//! End-to-end scenario tests.
//!
//! These tests run whole scenarios against the in-memory service: pairwise
//! connection negotiation, conversation provisioning, message payload
//! exchange, and mismatch validation beyond the unit test level.

use std::collections::{BTreeMap, BTreeSet};

use botlink::codec::{require_asset, require_text};
use botlink::config::Config;
use botlink::protocol::{
    assert_client_missing, assert_no_mismatch, connect_pair, prepare_conv, Bot, BotId, ClientId,
    ClientMismatch, ConvId, Sessions, UserId, CONNECT_ATTEMPTS,
};
use botlink::sim::{InMemoryService, SimAssetKey, SimAssetToken, SimKeyBundle, SimMessage};
use botlink::HarnessError;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn bots(n: usize) -> Vec<Bot> {
    (0..n)
        .map(|i| Bot::with_email(BotId::random(), format!("bot{i}@example.com")))
        .collect()
}

/// Two bots starting from no relation negotiate a connection and end up in
/// the 1:1 conversation the service provisioned on acceptance.
#[test]
fn test_two_bot_scenario() {
    init_tracing();
    let mut service = InMemoryService::new();
    let pair = bots(2);

    let conv = prepare_conv(&mut service, &Config::default(), &pair).unwrap();

    let looked_up = service
        .conversation_with(&pair[0], pair[1].id)
        .unwrap()
        .expect("1:1 conversation should exist after acceptance");
    assert_eq!(conv, looked_up);

    // One request and one acceptance were enough.
    assert_eq!(service.counts().requests, 1);
    assert_eq!(service.counts().accepts, 1);
}

/// Three bots negotiate all pairs and share a group conversation.
#[test]
fn test_group_scenario() {
    init_tracing();
    let mut service = InMemoryService::new();
    let group = bots(3);

    let conv = prepare_conv(&mut service, &Config::default(), &group).unwrap();

    let roster = service.group_members(conv).unwrap();
    for bot in &group {
        assert!(roster.contains(&bot.id));
    }
    // C(3,2) = 3 pairs, each accepted once.
    assert_eq!(service.counts().accepts, 3);
}

/// The connection greeting from the config reaches the service verbatim, and
/// the sender's address rides along (empty when absent).
#[test]
fn test_connection_request_carries_greeting_and_address() {
    init_tracing();
    let mut service = InMemoryService::new();
    let mut config = Config::default();
    config.connect.greeting = "please connect".to_string();

    let a = Bot::with_email(BotId::random(), "alice@example.com");
    let b = Bot::new(BotId::random());
    prepare_conv(&mut service, &config, &[a.clone(), b]).unwrap();

    let request = &service.requests()[0];
    assert_eq!(request.from, a.id);
    assert_eq!(request.address, "alice@example.com");
    assert_eq!(request.greeting, "please connect");
}

/// A service that never surfaces pending requests makes negotiation give up
/// after exactly the budget, and provisioning fails downstream.
#[test]
fn test_frozen_service_fails_downstream_only() {
    init_tracing();
    let mut service = InMemoryService::with_frozen_pending();
    let pair = bots(2);

    // The negotiator itself does not error.
    let verdict = connect_pair(&mut service, &pair[0], &pair[1], "hi").unwrap();
    assert!(!verdict.is_connected());
    assert_eq!(service.counts().status_queries, CONNECT_ATTEMPTS);

    // The provisioner is the step that surfaces the failure.
    let err = prepare_conv(&mut service, &Config::default(), &pair).unwrap_err();
    assert!(matches!(err, HarnessError::MissingConversation { .. }));
}

/// Full payload exchange: text and asset messages travel as opaque blobs and
/// come back intact on the receiving side.
#[test]
fn test_message_payload_exchange() {
    init_tracing();
    let mut service = InMemoryService::new();
    let group = bots(3);
    let _conv = prepare_conv(&mut service, &Config::default(), &group).unwrap();

    // Text payload.
    let wire = SimMessage::text("status: all pairs connected")
        .encode()
        .unwrap();
    assert_eq!(require_text(&wire).unwrap(), "status: all pairs connected");

    // Asset payload with decryption material, token-gated.
    let bundle = SimKeyBundle {
        otr_key: [7; 32],
        sha256: [9; 32],
    };
    let wire = SimMessage::asset(
        SimAssetKey("3-2-aa1b".to_string()),
        Some(SimAssetToken("secret-token".to_string())),
        bundle.clone(),
    )
    .encode()
    .unwrap();

    let info = require_asset::<SimAssetKey, SimAssetToken, SimKeyBundle>(&wire).unwrap();
    assert_eq!(info.key.0, "3-2-aa1b");
    assert_eq!(info.token.unwrap().0, "secret-token");
    assert_eq!(info.keys, bundle);

    // Requiring the wrong variant is a scenario failure, not a decode error.
    let text_wire = SimMessage::text("oops").encode().unwrap();
    let err = require_asset::<SimAssetKey, SimAssetToken, SimKeyBundle>(&text_wire).unwrap_err();
    assert!(matches!(err, HarnessError::RequirementFailed { .. }));
}

/// Mismatch reports coming back from message sends validate as expected: a
/// clean send passes `assert_no_mismatch`, and a send missing one device
/// passes `assert_client_missing` for exactly that device.
#[test]
fn test_mismatch_validation_flow() {
    init_tracing();

    // Clean send.
    let clean: ClientMismatch = serde_json::from_str("{}").unwrap();
    assert_no_mismatch(&clean).unwrap();

    // Send that missed one device of one user.
    let user = UserId::random();
    let device = ClientId::random();
    let report = ClientMismatch {
        missing: BTreeMap::from([(user, BTreeSet::from([device]))]),
        ..Default::default()
    };
    assert_client_missing(user, device, &report).unwrap();

    // The same report is not "no mismatch".
    let failure = assert_no_mismatch(&report).unwrap_err();
    assert!(failure.actual.contains("missing="));

    // And it does not pass for a different device.
    assert!(assert_client_missing(user, ClientId::random(), &report).is_err());
}

/// Conversation ids survive serde interchange with scenario runners.
#[test]
fn test_conv_id_interchange() {
    let conv = ConvId::random();
    let json = serde_json::to_string(&conv).unwrap();
    let back: ConvId = serde_json::from_str(&json).unwrap();
    assert_eq!(conv, back);
}
