//! Audio streaming through the relay.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use futures_util::StreamExt;
use serde_json::json;

mod common;

use common::{audio_bytes, relay_config, start_mock_upstream, start_relay, synthesize, MockReply, Tail};

#[tokio::test]
async fn test_audio_relayed_byte_for_byte() {
    let chunks = vec![
        audio_bytes(1, 1),
        audio_bytes(4096, 2),
        audio_bytes(17, 3),
        audio_bytes(65_536, 4),
        audio_bytes(333, 5),
    ];
    let expected: Vec<u8> = chunks.concat();
    let upstream = start_mock_upstream(MockReply::audio(chunks)).await;
    let relay = start_relay(relay_config(&upstream)).await;

    let res = synthesize(&relay, json!({"text": "hello", "voiceId": "v1"})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "audio/mpeg");
    assert_eq!(res.headers()["cache-control"], "no-store");

    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), expected.len());
    assert!(body.as_ref() == expected.as_slice(), "relayed audio differs");
}

#[tokio::test]
async fn test_empty_audio_body_is_empty_success() {
    let upstream = start_mock_upstream(MockReply::audio(vec![])).await;
    let relay = start_relay(relay_config(&upstream)).await;

    let res = synthesize(&relay, json!({"text": "hello", "voiceId": "v1"})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_request_shape() {
    let upstream = start_mock_upstream(MockReply::audio(vec![b"ID3".to_vec()])).await;
    let relay = start_relay(relay_config(&upstream)).await;

    let res = synthesize(
        &relay,
        json!({
            "text": "  Hola mundo  ",
            "voiceId": " voice a/b ",
            "modelId": "eleven_turbo_v2_5",
            "languageCode": "es",
            "stability": 0.3,
            "similarityBoost": "0.9",
            "style": 0.2,
            "useSpeakerBoost": false
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let _ = res.bytes().await.unwrap();

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];

    assert_eq!(sent.method, "POST");
    assert_eq!(
        sent.target,
        "/v1/text-to-speech/voice%20a%2Fb/stream?output_format=mp3_44100_128"
    );
    assert_eq!(sent.headers["xi-api-key"], common::API_KEY);
    assert_eq!(sent.headers["accept"], "audio/mpeg");
    assert!(sent.headers["content-type"].starts_with("application/json"));
    assert!(
        !sent.headers.contains_key("x-proxy-secret"),
        "caller secret must not leak upstream"
    );

    assert_eq!(
        sent.json(),
        json!({
            "text": "Hola mundo",
            "model_id": "eleven_turbo_v2_5",
            "language_code": "es",
            "voice_settings": {
                "stability": 0.3,
                "similarity_boost": 0.9,
                "style": 0.2,
                "use_speaker_boost": false
            }
        })
    );
}

#[tokio::test]
async fn test_defaults_fill_missing_tunables() {
    let upstream = start_mock_upstream(MockReply::audio(vec![b"ID3".to_vec()])).await;
    let relay = start_relay(relay_config(&upstream)).await;

    let res = synthesize(
        &relay,
        json!({"text": "hi", "voiceId": "v1", "modelId": "  ", "stability": "loud"}),
    )
    .await;
    let _ = res.bytes().await.unwrap();

    let body = upstream.requests()[0].json();
    assert_eq!(body["model_id"], "eleven_multilingual_v2");
    assert_eq!(body["language_code"], "en");
    assert_eq!(body["voice_settings"]["stability"], 0.5);
    assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
    assert_eq!(body["voice_settings"]["style"], 0.0);
    assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
}

#[tokio::test]
async fn test_mid_stream_drop_terminates_caller_body() {
    let upstream = start_mock_upstream(
        MockReply::audio(vec![audio_bytes(2048, 7), audio_bytes(2048, 8)]).tail(Tail::Drop),
    )
    .await;
    let relay = start_relay(relay_config(&upstream)).await;

    let res = synthesize(&relay, json!({"text": "hello", "voiceId": "v1"})).await;
    assert_eq!(res.status(), StatusCode::OK, "headers were committed before the failure");

    let mut received = 0usize;
    let mut saw_error = false;
    let mut body = Box::pin(res.bytes_stream());
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => received += bytes.len(),
            Err(_) => {
                saw_error = true;
                break;
            }
        }
    }

    assert!(saw_error, "a truncated upstream must not look like a complete body");
    assert!(received <= 4096);
}

#[tokio::test]
async fn test_deadline_expiring_mid_body_aborts_stream() {
    let upstream = start_mock_upstream(
        MockReply::audio(vec![audio_bytes(1024, 9)]).tail(Tail::Stall(Duration::from_secs(10))),
    )
    .await;
    let mut config = relay_config(&upstream);
    config.upstream.request_timeout_ms = 300;
    let relay = start_relay(config).await;

    let res = synthesize(&relay, json!({"text": "hello", "voiceId": "v1"})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let result = tokio::time::timeout(Duration::from_secs(5), res.bytes())
        .await
        .expect("relay must not hang past its deadline");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_caller_disconnect_releases_upstream() {
    let upstream = start_mock_upstream(
        MockReply::audio(vec![audio_bytes(1024, 10)]).tail(Tail::Stall(Duration::from_secs(30))),
    )
    .await;
    let relay = start_relay(relay_config(&upstream)).await;

    let res = synthesize(&relay, json!({"text": "hello", "voiceId": "v1"})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let mut body = Box::pin(res.bytes_stream());
    let first = body.next().await.unwrap().unwrap();
    assert!(!first.is_empty());
    drop(body);

    // Bounded well inside the 5s upstream deadline.
    let started = Instant::now();
    while upstream.closed_by_relay() == 0 {
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "upstream connection still open after the caller left"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(upstream.closed_by_relay(), 1);
}

#[tokio::test]
async fn test_concurrent_streams_stay_independent() {
    let payload = audio_bytes(32 * 1024, 11);
    let chunks: Vec<Vec<u8>> = payload.chunks(1000).map(|c| c.to_vec()).collect();
    let upstream = start_mock_upstream(MockReply::audio(chunks)).await;
    let relay = std::sync::Arc::new(start_relay(relay_config(&upstream)).await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let relay = relay.clone();
        handles.push(tokio::spawn(async move {
            let res = synthesize(&relay, json!({"text": format!("line {}", i), "voiceId": "v1"})).await;
            assert_eq!(res.status(), StatusCode::OK);
            res.bytes().await.unwrap()
        }));
    }

    for handle in handles {
        let body = handle.await.unwrap();
        assert!(body.as_ref() == payload.as_slice());
    }
    assert_eq!(upstream.hits(), 8);
}
