//! End-to-end fan-out against a mock HTTP server using the real adapters.

use std::path::PathBuf;
use std::sync::Arc;

use fanout_dispatch::settings::{EnvOverrides, RawSettings};
use fanout_dispatch::sink::SlotState;
use fanout_dispatch::{CredentialStore, Dispatcher, MemoryCredentialStore, RecordingSink, Settings, SkipReason};
use fanout_llmproxy::{Provider, ProviderConfig, build_client};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    let base = server.uri();
    let raw = RawSettings {
        providers: Some(vec![
            ProviderConfig::new("free", "Pollinations", Provider::Pollinations, "openai")
                .with_base_url(format!("{base}/text")),
            ProviderConfig::new("groq1", "Llama 3.3 (Smart)", Provider::Groq, "llama-3.3-70b-versatile")
                .with_base_url(format!("{base}/groq"))
                .with_credential_key("groq"),
            ProviderConfig::new("gemini", "Gemini", Provider::Gemini, "gemini-1.5-flash")
                .with_base_url(format!("{base}/gemini")),
            ProviderConfig::new("other", "Other Groq", Provider::Groq, "llama")
                .with_base_url(format!("{base}/other"))
                .with_credential_key("other"),
        ]),
        ..RawSettings::default()
    };
    Settings::from_parts(raw, EnvOverrides::default(), Some(PathBuf::from("unused.json"))).unwrap()
}

#[tokio::test]
async fn every_provider_reaches_a_terminal_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/text/.+"))
        .respond_with(ResponseTemplate::new(200).set_body_string("free answer"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/groq/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "groq answer"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gemini/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path_regex(r"^/other/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryCredentialStore::new();
    store.set("groq", "gsk_integration").unwrap();
    store.set("gemini", "AIza-integration").unwrap();

    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Dispatcher::from_settings(&settings(&server), build_client().unwrap(), sink.clone()).unwrap();

    let handle = dispatcher.dispatch("What is Rust?", &store.snapshot().unwrap()).unwrap();
    assert_eq!(handle.tasks().len(), 3);
    let outcomes = handle.join().await;
    assert_eq!(outcomes.len(), 3);

    assert!(matches!(sink.slot("free"), Some(SlotState::Result { text, .. }) if text == "free answer"));
    assert!(matches!(sink.slot("groq1"), Some(SlotState::Result { text, .. }) if text == "groq answer"));
    assert!(matches!(
        sink.slot("gemini"),
        Some(SlotState::Error { message }) if message.starts_with("Invalid Gemini key")
    ));
    assert_eq!(
        sink.slot("other"),
        Some(SlotState::Skipped(SkipReason::MissingCredential {
            credential_key: "other".into()
        }))
    );
    assert_eq!(sink.terminal_order().len(), 4);
}
