//! Gemini classifier and ElevenLabs verifier against a canned local HTTP
//! responder, checking both the request shape and reply handling.

use std::time::Duration;

use soul_talk::config::{ElevenLabsSettings, GeminiSettings};
use soul_talk::soul_color::{
    fallback_color, ClassifierError, FallbackClassifier, GeminiClassifier, SoulColorClassifier,
};
use soul_talk::voice::{ElevenLabsVerifier, PhraseVerifier, VerifyError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One captured request
struct Captured {
    head: String,
    body: Vec<u8>,
}

/// Serve a single response and hand back what the client sent.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        captured
    });
    (url, task)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let lower = head.to_ascii_lowercase();
    let mut body = buf[header_end..].to_vec();

    if let Some(len) = lower
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
    {
        while body.len() < len {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if lower.contains("transfer-encoding: chunked") {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    }

    Captured { head, body }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
    .to_string()
}

fn gemini(url: String) -> GeminiClassifier {
    GeminiClassifier::new(
        &GeminiSettings {
            api_key: Some("test-key".into()),
            model: "gemini-test".into(),
            url,
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

fn answers() -> Vec<String> {
    vec![
        "I recharge alone, then talk for hours".to_string(),
        "Rainy Sundays".to_string(),
    ]
}

#[tokio::test]
async fn gemini_request_and_reply() {
    let (url, server) = serve_once(
        "200 OK",
        gemini_reply("soul_color_id: lavender-mist\nreasoning: Notices small things."),
    )
    .await;

    let c = gemini(url).classify(&answers()).await.unwrap();
    assert_eq!(c.soul_color_id, "lavender-mist");
    assert_eq!(c.reasoning, "Notices small things.");

    let captured = server.await.unwrap();
    assert!(captured
        .head
        .starts_with("POST /models/gemini-test:generateContent "));
    assert!(captured
        .head
        .to_ascii_lowercase()
        .contains("x-goog-api-key: test-key"));
    let body: serde_json::Value = serde_json::from_slice(&captured.body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("1. I recharge alone, then talk for hours"));
    assert!(prompt.contains("soul_color_id: [ID]"));
}

#[tokio::test]
async fn gemini_http_error_is_request_failed() {
    let (url, _server) = serve_once("500 Internal Server Error", "{}".to_string()).await;
    let err = gemini(url).classify(&answers()).await.unwrap_err();
    assert!(matches!(err, ClassifierError::RequestFailed(msg) if msg.contains("500")));
}

#[tokio::test]
async fn fallback_hides_gemini_failures() {
    let (url, _server) = serve_once("503 Service Unavailable", "{}".to_string()).await;
    let c = FallbackClassifier::new(gemini(url))
        .classify(&answers())
        .await
        .unwrap();
    assert_eq!(c.soul_color_id, fallback_color(&answers()).id);
    assert_eq!(c.reasoning, "Assigned due to API error");

    let (url, _server) = serve_once("200 OK", gemini_reply("soul_color_id: neon-plaid")).await;
    let c = FallbackClassifier::new(gemini(url))
        .classify(&answers())
        .await
        .unwrap();
    assert_eq!(c.reasoning, "Auto-assigned based on availability");
}

fn elevenlabs(url: String) -> ElevenLabsVerifier {
    ElevenLabsVerifier::new(
        &ElevenLabsSettings {
            api_key: Some("xi-test".into()),
            model: "scribe_v1".into(),
            url,
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn elevenlabs_request_and_match() {
    let (url, server) = serve_once(
        "200 OK",
        serde_json::json!({ "text": "  The quick brown fox. " }).to_string(),
    )
    .await;

    let result = elevenlabs(url)
        .verify(b"RIFF....WAVEfmt ", "the quick brown fox")
        .await
        .unwrap();
    assert!(result.verified);
    assert_eq!(result.transcript, "The quick brown fox.");

    let captured = server.await.unwrap();
    let head = captured.head.to_ascii_lowercase();
    assert!(head.starts_with("post /speech-to-text "));
    assert!(head.contains("xi-api-key: xi-test"));
    assert!(head.contains("multipart/form-data"));
    let body = String::from_utf8_lossy(&captured.body);
    assert!(body.contains("name=\"model_id\""));
    assert!(body.contains("scribe_v1"));
    assert!(body.contains("name=\"file\""));
}

#[tokio::test]
async fn elevenlabs_contains_either_way() {
    let (url, _server) = serve_once(
        "200 OK",
        serde_json::json!({ "text": "okay so the quick brown fox jumps" }).to_string(),
    )
    .await;
    let result = elevenlabs(url)
        .verify(b"audio", "The quick brown fox")
        .await
        .unwrap();
    assert!(result.verified);
}

#[tokio::test]
async fn elevenlabs_empty_transcript_never_verifies() {
    let (url, _server) = serve_once("200 OK", serde_json::json!({}).to_string()).await;
    let result = elevenlabs(url).verify(b"audio", "hello").await.unwrap();
    assert!(!result.verified);
    assert_eq!(result.transcript, "");
}

#[tokio::test]
async fn elevenlabs_rejects_empty_input() {
    let verifier = elevenlabs("http://127.0.0.1:9".to_string());
    assert!(matches!(
        verifier.verify(b"", "hello").await,
        Err(VerifyError::EmptyAudio)
    ));
    assert!(matches!(
        verifier.verify(b"audio", "  ").await,
        Err(VerifyError::EmptyPhrase)
    ));
}
