use hover_translate::cloud::{build_request_body, cloud_language_code, parse_response, GoogleCloudTranslator};
use hover_translate::collaborators::CloudTranslator;
use hover_translate::session::LanguagePair;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[test]
fn maps_language_codes_for_the_service() {
    assert_eq!(cloud_language_code("zh-Hans"), "zh-CN");
    assert_eq!(cloud_language_code("zh_Hant"), "zh-TW");
    assert_eq!(cloud_language_code("en-GB"), "en");
    assert_eq!(cloud_language_code("FR"), "fr");
}

#[test]
fn request_body_matches_api_shape() {
    let body = build_request_body("apple", &LanguagePair::new("en", "zh-Hans"));
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "q": ["apple"],
            "source": "en",
            "target": "zh-CN",
            "format": "text"
        })
    );
}

#[test]
fn parses_first_translation() {
    let body = r#"{"data":{"translations":[{"translatedText":"苹果","detectedSourceLanguage":"en"}]}}"#;
    let parsed = parse_response(body).unwrap();
    assert_eq!(parsed.text, "苹果");
    assert_eq!(parsed.detected_language.as_deref(), Some("en"));

    assert!(parse_response(r#"{"data":{"translations":[]}}"#).is_err());
    assert!(parse_response("not json").is_err());
}

#[test]
fn request_url_carries_key() {
    let translator = GoogleCloudTranslator::new(
        "https://translation.example.com/v2",
        Some("secret".into()),
        Duration::from_secs(1),
    )
    .unwrap();
    assert_eq!(
        translator.request_url("secret").unwrap().as_str(),
        "https://translation.example.com/v2?key=secret"
    );
}

#[tokio::test]
async fn unconfigured_translator_returns_none() {
    let translator = GoogleCloudTranslator::new(
        "http://127.0.0.1:9/unused",
        Some("  ".into()),
        Duration::from_secs(1),
    )
    .unwrap();
    assert!(!translator.is_configured());
    assert!(translator
        .translate("apple", &LanguagePair::new("en", "fr"))
        .await
        .is_none());
}

async fn serve_once(listener: TcpListener, status: &'static str, body: &'static str) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        request.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&request).to_string();
        if let Some(split) = text.find("\r\n\r\n") {
            let length = text[..split]
                .lines()
                .find_map(|l| {
                    let lower = l.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if request.len() >= split + 4 + length || n == 0 {
                break;
            }
        }
        if n == 0 {
            break;
        }
    }
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.unwrap();
    String::from_utf8_lossy(&request).to_string()
}

#[tokio::test]
async fn posts_request_and_reads_translation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/language/translate/v2", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_once(
        listener,
        "200 OK",
        r#"{"data":{"translations":[{"translatedText":"pomme","detectedSourceLanguage":"en"}]}}"#,
    ));

    let translator =
        GoogleCloudTranslator::new(&endpoint, Some("k123".into()), Duration::from_secs(5)).unwrap();
    let result = translator
        .translate("apple", &LanguagePair::new("en", "fr"))
        .await
        .unwrap();
    assert_eq!(result.text, "pomme");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /language/translate/v2?key=k123 "));
    assert!(request.contains(r#""target":"fr""#));
}

#[tokio::test]
async fn service_error_yields_none() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v2", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_once(
        listener,
        "403 Forbidden",
        r#"{"error":{"message":"API key not valid"}}"#,
    ));

    let translator =
        GoogleCloudTranslator::new(&endpoint, Some("bad".into()), Duration::from_secs(5)).unwrap();
    assert!(translator
        .translate("apple", &LanguagePair::new("en", "fr"))
        .await
        .is_none());
    server.await.unwrap();
}
