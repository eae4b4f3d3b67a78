//! End-to-end provider scenarios against stubbed backends

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use easel_imagegen::{GenerationParams, ImageProvider, ProviderOptions, ProviderRegistry};
use mockito::Matcher;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n fake image payload";

fn gemini_options(server: &mockito::Server) -> ProviderOptions {
    ProviderOptions::default().api_key("g-key").base_url(server.url())
}

fn openai_options(server: &mockito::Server) -> ProviderOptions {
    ProviderOptions::default().api_key("sk-live").base_url(server.url())
}

#[tokio::test]
async fn gemini_inline_bytes_become_a_data_url() {
    let mut server = mockito::Server::new_async().await;
    let payload = BASE64.encode(PNG_BYTES);
    let mock = server
        .mock("POST", "/models/imagen-4.0-generate-001:predict")
        .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"predictions": [{{"bytesBase64Encoded": "{payload}", "mimeType": "image/png"}}]}}"#
        ))
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("gemini"), &gemini_options(&server)).unwrap();

    let params = GenerationParams::new("sunset over mountains").with_size("1:1").with_style("natural");
    let result = provider.generate(&params).await;

    mock.assert_async().await;
    assert!(result.success, "expected success, got: {:?}", result.error);
    assert!(result.url.unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(result.metadata["aspect_ratio"], "1:1");
    assert_eq!(result.metadata["original_prompt"], "sunset over mountains");
    assert_eq!(result.provider, "gemini");

    let revised = result.revised_prompt.unwrap();
    assert!(revised.starts_with("sunset over mountains"));
    assert!(revised.ends_with("natural lighting, realistic tones, soft composition"));
}

#[tokio::test]
async fn gemini_wrapped_bytes_are_also_recognized() {
    let mut server = mockito::Server::new_async().await;
    let payload = BASE64.encode(PNG_BYTES);
    let mock = server
        .mock("POST", "/models/imagen-4.0-generate-001:predict")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"predictions": [{{"image": {{"imageBytes": "{payload}"}}}}]}}"#))
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("gemini"), &gemini_options(&server)).unwrap();
    let result = provider.generate(&GenerationParams::new("a lighthouse")).await;

    mock.assert_async().await;
    assert!(result.success);
    assert!(result.url.unwrap().starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn gemini_empty_predictions_fold_into_failure() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/imagen-4.0-generate-001:predict")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"predictions": []}"#)
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("gemini"), &gemini_options(&server)).unwrap();
    let result = provider.generate(&GenerationParams::new("a lighthouse")).await;

    mock.assert_async().await;
    assert!(!result.success);
    assert!(result.url.is_none());
    assert!(result.error.unwrap().contains("no result"));
}

#[tokio::test]
async fn gemini_unrecognized_shape_folds_into_failure() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/imagen-4.0-generate-001:predict")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"predictions": [{"safetyAttributes": {"blocked": false}}]}"#)
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("gemini"), &gemini_options(&server)).unwrap();
    let result = provider.generate(&GenerationParams::new("a lighthouse")).await;

    mock.assert_async().await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("unrecognized response format"));
}

#[tokio::test]
async fn backend_error_status_folds_into_failure() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/imagen-4.0-generate-001:predict")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("quota exhausted")
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("gemini"), &gemini_options(&server)).unwrap();
    let result = provider.generate(&GenerationParams::new("a lighthouse")).await;

    mock.assert_async().await;
    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("429"));
    assert!(error.contains("quota exhausted"));
    assert_eq!(result.metadata["model"], "imagen-4.0-generate-001");
}

#[tokio::test]
async fn openai_invalid_size_never_reaches_the_backend() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", "/images/generations").expect(0).create_async().await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("openai"), &openai_options(&server)).unwrap();
    let result = provider.generate(&GenerationParams::new("a cat").with_size("999x999")).await;

    mock.assert_async().await;
    assert!(!result.success);
    assert!(result.url.is_none());

    let error = result.error.unwrap();
    assert!(error.contains("999x999"));
    for token in ["1024x1024", "1792x1024", "1024x1792"] {
        assert!(error.contains(token), "expected '{token}' in: {error}");
    }
}

#[tokio::test]
async fn openai_url_response_passes_through() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .match_header("authorization", "Bearer sk-live")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"created": 1700000000, "data": [{"url": "https://img.example/out.png", "revised_prompt": "a very fluffy cat"}]}"#,
        )
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("openai"), &openai_options(&server)).unwrap();
    let params = GenerationParams::new("a cat").with_size("1792x1024").with_quality("hd");
    let result = provider.generate(&params).await;

    mock.assert_async().await;
    assert!(result.success, "expected success, got: {:?}", result.error);
    assert_eq!(result.url.as_deref(), Some("https://img.example/out.png"));
    assert_eq!(result.revised_prompt.as_deref(), Some("a very fluffy cat"));
    assert_eq!(result.metadata["model"], "dall-e-3");
    assert_eq!(result.metadata["size"], "1792x1024");
    assert_eq!(result.metadata["quality"], "hd");
    assert_eq!(result.provider, "openai");
}

#[tokio::test]
async fn openai_b64_response_becomes_a_data_url() {
    let mut server = mockito::Server::new_async().await;
    let payload = BASE64.encode(PNG_BYTES);
    let mock = server
        .mock("POST", "/images/generations")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"created": 1700000000, "data": [{{"b64_json": "{payload}"}}]}}"#))
        .create_async()
        .await;

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("openai"), &openai_options(&server)).unwrap();
    let result = provider.generate(&GenerationParams::new("a cat")).await;

    mock.assert_async().await;
    assert!(result.success);
    assert_eq!(result.url.unwrap(), format!("data:image/png;base64,{payload}"));
}

#[tokio::test]
async fn vertex_routes_through_the_project_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let payload = BASE64.encode(PNG_BYTES);
    let mock = server
        .mock(
            "POST",
            "/projects/demo-project/locations/europe-west4/publishers/google/models/imagen-4.0-generate-001:predict",
        )
        .match_header("authorization", "Bearer ya29.token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"predictions": [{{"bytesBase64Encoded": "{payload}", "mimeType": "image/png"}}]}}"#
        ))
        .create_async()
        .await;

    let options = ProviderOptions::default()
        .api_key("ya29.token")
        .base_url(server.url())
        .project("demo-project")
        .location("europe-west4");

    let registry = ProviderRegistry::with_builtins();
    let provider = registry.get(Some("vertex"), &options).unwrap();
    let result = provider.generate(&GenerationParams::new("alpine meadow").with_size("16:9")).await;

    mock.assert_async().await;
    assert!(result.success, "expected success, got: {:?}", result.error);
    assert_eq!(result.metadata["aspect_ratio"], "16:9");
    assert_eq!(result.metadata["project"], "demo-project");
    assert_eq!(result.provider, "vertex");
}

#[tokio::test]
async fn validation_failure_metadata_snapshots_the_request() {
    let registry = ProviderRegistry::with_builtins();
    let provider = registry
        .get(Some("gemini"), &ProviderOptions::default().api_key("g-key"))
        .unwrap();

    let result = provider.generate(&GenerationParams::new("   ")).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("prompt"));
    assert_eq!(result.metadata["size"], "1024x1024");
    assert_eq!(result.metadata["style"], "vivid");
}
