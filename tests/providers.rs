//! Provider clients against a mock HTTP server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voiceform::core::CanonicalAudio;
use voiceform::core::dialogue::{
    DialogueEngine, DialogueState, GREETING, OpenAIChatConfig, OpenAIDialogueEngine,
};
use voiceform::core::stt::{OpenAISTTConfig, OpenAITranscriber, STTError, Transcriber};
use voiceform::core::tts::{ElevenLabsTTS, ElevenLabsTTSConfig, Synthesizer, TTSError};

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn transcriber(server: &MockServer) -> OpenAITranscriber {
    OpenAITranscriber::new(OpenAISTTConfig {
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_whisper_transcription() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": " hi there " })))
        .expect(1)
        .mount(&server)
        .await;

    let audio = CanonicalAudio::new(vec![0i16; 1600]);
    let transcript = transcriber(&server).transcribe(&audio, "en").await.unwrap();

    assert_eq!(transcript, "hi there");
}

#[tokio::test]
async fn test_whisper_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let audio = CanonicalAudio::new(vec![0i16; 1600]);
    let result = transcriber(&server).transcribe(&audio, "en").await;

    assert!(matches!(result, Err(STTError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_chat_extracts_fields_then_replies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "```json\n{\"SiteCompanyName1\": \"Acme Widgets\", \"SiteCity\": null}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.7 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("  Thanks! Which city is the site in?  ")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let engine = OpenAIDialogueEngine::new(OpenAIChatConfig {
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();

    let mut state = DialogueState::new(GREETING);
    state.record_user("the business is Acme Widgets");
    let reply = engine
        .respond("the business is Acme Widgets", &mut state)
        .await
        .unwrap();

    assert_eq!(reply.text, "Thanks! Which city is the site in?");
    assert!(!reply.end_of_session);
    assert_eq!(state.field("SiteCompanyName1"), Some("Acme Widgets"));
    assert_eq!(state.field("SiteCity"), None);
}

#[tokio::test]
async fn test_chat_survives_failed_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("not json")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.7 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("All set. END OF CONVERSATION")),
        )
        .mount(&server)
        .await;

    let engine = OpenAIDialogueEngine::new(OpenAIChatConfig {
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();

    let mut state = DialogueState::new(GREETING);
    state.record_user("yes, that's everything");
    let reply = engine
        .respond("yes, that's everything", &mut state)
        .await
        .unwrap();

    assert!(reply.end_of_session);
    assert!(state.form_fields().values().all(Option::is_none));
}

fn synthesizer(server: &MockServer) -> ElevenLabsTTS {
    ElevenLabsTTS::new(ElevenLabsTTSConfig {
        api_key: "el-test".to_string(),
        base_url: server.uri(),
        voice_id: "voice123".to_string(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_elevenlabs_synthesis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text-to-speech/voice123"))
        .and(header("xi-api-key", "el-test"))
        .and(query_param("output_format", "mp3_44100_128"))
        .and(body_partial_json(json!({ "text": "Hello there" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake-mp3".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let audio = synthesizer(&server).synthesize("Hello there").await.unwrap();

    assert_eq!(audio.data, b"ID3fake-mp3");
    assert_eq!(audio.format, "mp3");
}

#[tokio::test]
async fn test_elevenlabs_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text-to-speech/voice123"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = synthesizer(&server).synthesize("Hello there").await;

    assert!(matches!(result, Err(TTSError::ProviderError(msg)) if msg.contains("boom")));
}
