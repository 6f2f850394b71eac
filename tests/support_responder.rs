use std::time::Duration;

use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;

use resale_market::api::gemini_client::{GeminiClient, GeminiError};
use resale_market::config::GeminiConfig;
use resale_market::support::{SupportResponder, Topic, classify, fallback_response};

fn gemini_config(base_url: String, timeout: Duration) -> GeminiConfig {
    GeminiConfig {
        api_key: "test-key".to_string(),
        base_url,
        model: "gemini-test".to_string(),
        timeout,
    }
}

fn responder(server: &MockServer, timeout: Duration) -> SupportResponder {
    let client = GeminiClient::new(&gemini_config(server.url(""), timeout)).expect("client");
    SupportResponder::new(Some(client))
}

#[test]
fn classify_follows_keyword_priority() {
    assert_eq!(classify("Hello there"), Some(Topic::Greeting));
    assert_eq!(classify("I am looking for a bike"), Some(Topic::Search));
    assert_eq!(classify("is this eco friendly"), Some(Topic::Sustainability));
    assert_eq!(classify("what does it cost"), Some(Topic::Pricing));
    assert_eq!(classify("is it damaged"), Some(Topic::Condition));
    assert_eq!(classify("shipping to Delhi?"), Some(Topic::Shipping));
    assert_eq!(classify("I'd like a refund"), Some(Topic::Returns));
    assert_eq!(classify("reset my login"), Some(Topic::Account));
    assert_eq!(classify("how does this work"), Some(Topic::Help));
    // greeting outranks pricing
    assert_eq!(classify("hi, what's the price?"), Some(Topic::Greeting));
}

#[test]
fn keywords_match_whole_words_only() {
    assert_eq!(classify("this"), None);
    assert_eq!(classify("shipment"), None);
    assert_eq!(classify("HI"), Some(Topic::Greeting));
}

#[test]
fn multi_word_keywords_match_as_phrases() {
    assert_eq!(classify("just looking for ideas"), Some(Topic::Search));
    assert_eq!(classify("for looking"), None);
}

#[test]
fn unmatched_message_is_echoed() {
    let reply = fallback_response("quantum flux");
    assert!(reply.contains("'quantum flux'"), "{reply}");
}

#[actix_web::test]
async fn unconfigured_responder_uses_fallback() {
    let responder = SupportResponder::fallback_only();
    assert!(!responder.is_ai_enabled());
    assert_eq!(responder.respond("hello").await, fallback_response("hello"));
}

#[actix_web::test]
async fn gemini_answer_is_returned() {
    let server = MockServer::start_async().await;
    let mock = server.mock_async(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .query_param("key", "test-key");
        then.status(200).json_body(json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Try the furniture section." } ] } }
            ]
        }));
    }).await;

    let reply = responder(&server, Duration::from_secs(5))
        .respond("where are chairs")
        .await;

    mock.assert_async().await;
    assert_eq!(reply, "Try the furniture section.");
}

#[actix_web::test]
async fn server_error_falls_back() {
    let server = MockServer::start_async().await;
    let mock = server.mock_async(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(500).body("quota exceeded");
    }).await;

    let reply = responder(&server, Duration::from_secs(5)).respond("hello").await;

    mock.assert_async().await;
    assert_eq!(reply, fallback_response("hello"));
}

#[actix_web::test]
async fn missing_candidate_text_falls_back() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(200).json_body(json!({ "candidates": [] }));
    }).await;

    let reply = responder(&server, Duration::from_secs(5)).respond("refund").await;
    assert_eq!(reply, fallback_response("refund"));
}

#[actix_web::test]
async fn slow_ai_falls_back_within_timeout() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({
                "candidates": [ { "content": { "parts": [ { "text": "late" } ] } } ]
            }));
    }).await;

    let started = std::time::Instant::now();
    let reply = responder(&server, Duration::from_millis(300))
        .respond("price")
        .await;

    assert_eq!(reply, fallback_response("price"));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[actix_web::test]
async fn client_reports_api_status_and_body() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(429).body("slow down");
    }).await;

    let client = GeminiClient::new(&gemini_config(server.url(""), Duration::from_secs(5))).expect("client");
    let err = client.generate("hello").await.expect_err("rate limited");
    assert!(matches!(err, GeminiError::Api { status: 429, .. }));
    assert_eq!(err.to_string(), "gemini api error status=429 body=slow down");

    let err = GeminiError::InvalidResponse("no candidate text".to_string());
    assert_eq!(err.to_string(), "invalid response: no candidate text");
    assert!(std::error::Error::source(&err).is_none());
}
