use crate::error::TranslationError;
use crate::i18n::Language;
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

/// Something that can translate an ordered batch of strings.
///
/// Contract: the returned list has exactly as many entries as `strings`, in
/// the same order, or the call fails. Implementations are free to batch
/// however suits the remote service.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        strings: &[String],
        target: Language,
    ) -> Result<Vec<String>, TranslationError>;
}

/// One step from the root of a JSON tree to a string leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a string leaf inside the tree being translated.
pub type TranslationPath = Vec<PathSegment>;

/// Collect every non-blank string leaf in depth-first order.
///
/// Array elements are visited individually. Blank strings have nothing to
/// translate and stay where they are.
pub fn collect_strings(value: &Value) -> (Vec<String>, Vec<TranslationPath>) {
    fn walk(
        value: &Value,
        current: &mut TranslationPath,
        strings: &mut Vec<String>,
        paths: &mut Vec<TranslationPath>,
    ) {
        match value {
            Value::String(s) if !s.trim().is_empty() => {
                strings.push(s.clone());
                paths.push(current.clone());
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    current.push(PathSegment::Index(idx));
                    walk(item, current, strings, paths);
                    current.pop();
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    current.push(PathSegment::Key(key.clone()));
                    walk(item, current, strings, paths);
                    current.pop();
                }
            }
            _ => {}
        }
    }

    let mut strings = Vec::new();
    let mut paths = Vec::new();
    walk(value, &mut Vec::new(), &mut strings, &mut paths);
    (strings, paths)
}

/// Overwrite the string at `path`. Paths come from [`collect_strings`] on a
/// clone of the same tree, so a missing step means the tree changed shape
/// and the write is skipped.
fn set_at_path(root: &mut Value, path: &[PathSegment], translated: String) {
    let mut current = root;
    for segment in path {
        let next = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key),
            (PathSegment::Index(idx), Value::Array(items)) => items.get_mut(*idx),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return,
        }
    }
    *current = Value::String(translated);
}

/// Translate every string leaf of `input` into `target` with one provider call.
///
/// The result has exactly the shape of `input`; `input` itself is never
/// modified. If the provider returns a different number of strings than it
/// was given, nothing is applied and the call fails.
pub async fn translate_json(
    provider: &dyn TranslationProvider,
    input: &Value,
    target: Language,
) -> Result<Value, TranslationError> {
    let mut output = input.clone();
    let (strings, paths) = collect_strings(&output);

    if strings.is_empty() {
        return Ok(output);
    }

    let translated = provider.translate(&strings, target).await?;
    if translated.len() != strings.len() {
        return Err(TranslationError::LineCountMismatch {
            sent: strings.len(),
            received: translated.len(),
        });
    }

    for (path, text) in paths.iter().zip(translated) {
        set_at_path(&mut output, path, text);
    }

    Ok(output)
}

// ==================== Google mobile page provider ====================

/// Default endpoint: the mobile translate page, which renders the result as
/// plain HTML.
pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.google.com/m";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";

static RESULT_REGEX: OnceLock<Regex> = OnceLock::new();
static BREAK_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Scrapes the Google Translate mobile page.
///
/// All strings of a batch are joined with newlines and sent as one query;
/// the page keeps line structure, so the answer splits back into the same
/// number of lines.
pub struct GoogleMobileTranslator {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl GoogleMobileTranslator {
    /// Create a translator with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            retry: RetryConfig::translation(),
        })
    }

    /// Replace the retry policy (tests use short delays).
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, text: &str, target: Language) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("sl", "auto"), ("tl", target.code()), ("q", text)])
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(TranslationError::Status { status, body });
        }

        let html = response.text().await?;
        extract_result(&html).ok_or(TranslationError::MissingPayload)
    }
}

#[async_trait]
impl TranslationProvider for GoogleMobileTranslator {
    async fn translate(
        &self,
        strings: &[String],
        target: Language,
    ) -> Result<Vec<String>, TranslationError> {
        // A newline inside one string would shift every line after it
        let combined = strings
            .iter()
            .map(|s| s.replace("\r\n", " ").replace('\n', " "))
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            "Sending {} strings ({} bytes) for translation to {}",
            strings.len(),
            combined.len(),
            target.name()
        );

        let translated = with_retry_if(
            &self.retry,
            &format!("Translation to {}", target.name()),
            || self.request(&combined, target),
            TranslationError::is_retryable,
        )
        .await?;

        let lines: Vec<String> = translated
            .split('\n')
            .map(|line| line.trim().to_string())
            .collect();

        if lines.len() != strings.len() {
            return Err(TranslationError::LineCountMismatch {
                sent: strings.len(),
                received: lines.len(),
            });
        }

        info!("Translated {} strings to {}", lines.len(), target.name());
        Ok(lines)
    }
}

/// Pull the translated text out of the mobile page.
fn extract_result(html: &str) -> Option<String> {
    let result = RESULT_REGEX.get_or_init(|| {
        Regex::new(r#"(?is)<div[^>]*class="result-container"[^>]*>(.*?)</div>"#)
            .expect("result regex is valid")
    });
    let captured = result.captures(html)?.get(1)?.as_str();

    let breaks = BREAK_REGEX
        .get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("break regex is valid"));
    let tags = TAG_REGEX.get_or_init(|| Regex::new(r"</?[^>]+(>|$)").expect("tag regex is valid"));

    let text = breaks.replace_all(captured, "\n");
    let text = tags.replace_all(&text, "");
    Some(decode_entities(&text).trim().to_string())
}

/// Decode the handful of entities the page emits. `&amp;` goes last so an
/// escaped entity is not decoded twice.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use wiremock::{
        matchers::{headers, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn result_page(text: &str) -> String {
        format!(
            r#"<html><body><div class="header">Google</div>
            <div dir="ltr" class="result-container">{}</div>
            <div class="footer">x</div></body></html>"#,
            text
        )
    }

    fn test_translator(server: &MockServer) -> GoogleMobileTranslator {
        GoogleMobileTranslator::new(&format!("{}/m", server.uri()), Duration::from_secs(5))
            .expect("client")
            .with_retry(RetryConfig::new(3, Duration::from_millis(10)))
    }

    // ==================== collect_strings Tests ====================

    #[test]
    fn test_collect_strings_depth_first_with_paths() {
        let value = json!({
            "name": "Brandnetel",
            "uses": ["Thee", "Soep"],
            "facts": { "origin": "Europa" }
        });

        let (strings, paths) = collect_strings(&value);

        assert_eq!(strings, vec!["Brandnetel", "Thee", "Soep", "Europa"]);
        assert_eq!(paths[0], vec![PathSegment::Key("name".into())]);
        assert_eq!(
            paths[2],
            vec![PathSegment::Key("uses".into()), PathSegment::Index(1)]
        );
        assert_eq!(
            paths[3],
            vec![PathSegment::Key("facts".into()), PathSegment::Key("origin".into())]
        );
    }

    #[test]
    fn test_collect_strings_skips_blank_and_non_strings() {
        let value = json!({ "a": "", "b": "  ", "c": 3, "d": true, "e": null, "f": "ok" });
        let (strings, _) = collect_strings(&value);
        assert_eq!(strings, vec!["ok"]);
    }

    // ==================== translate_json Tests ====================

    #[tokio::test]
    async fn test_translate_json_preserves_shape() {
        let provider = PrefixProvider::default();
        let input = json!({
            "name": "Brandnetel",
            "uses": ["Thee", ""],
            "facts": { "origin": "Europa" }
        });

        let output = translate_json(&provider, &input, Language::En)
            .await
            .expect("Should succeed");

        assert_eq!(
            output,
            json!({
                "name": "[en] Brandnetel",
                "uses": ["[en] Thee", ""],
                "facts": { "origin": "[en] Europa" }
            })
        );
        // Input is untouched
        assert_eq!(input["name"], json!("Brandnetel"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_translate_json_without_strings_makes_no_call() {
        let provider = PrefixProvider::default();
        let input = json!({ "flag": true, "list": [] });

        let output = translate_json(&provider, &input, Language::Sv)
            .await
            .expect("Should succeed");

        assert_eq!(output, input);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translate_json_fails_on_short_answer() {
        let input = json!({ "a": "een", "b": "twee" });
        let result = translate_json(&ShortProvider, &input, Language::En).await;

        assert!(matches!(
            result,
            Err(TranslationError::LineCountMismatch { sent: 2, received: 1 })
        ));
    }

    // ==================== Page Parsing Tests ====================

    #[test]
    fn test_extract_result_decodes_entities_and_breaks() {
        let html = result_page("Nettle &amp; dock<br>Tom&#39;s &quot;tea&quot;<br/><b>bold</b>");
        assert_eq!(
            extract_result(&html),
            Some("Nettle & dock\nTom's \"tea\"\nbold".to_string())
        );
    }

    #[test]
    fn test_extract_result_does_not_double_decode() {
        let html = result_page("&amp;lt;b&amp;gt;");
        assert_eq!(extract_result(&html), Some("&lt;b&gt;".to_string()));
    }

    #[test]
    fn test_extract_result_missing_container() {
        assert_eq!(extract_result("<html><body>Sorry</body></html>"), None);
    }

    // ==================== Integration Tests with Wiremock ====================

    #[tokio::test]
    async fn test_google_translator_single_batched_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .and(query_param("sl", "auto"))
            .and(query_param("tl", "en"))
            .and(query_param("q", "Brandnetel\nThee"))
            .and(headers("Accept-Language", vec!["en-US", "en;q=0.9"]))
            .respond_with(ResponseTemplate::new(200).set_body_string(result_page("Nettle\nTea")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = test_translator(&mock_server);
        let strings = vec!["Brandnetel".to_string(), "Thee".to_string()];

        let result = translator
            .translate(&strings, Language::En)
            .await
            .expect("Should succeed");

        assert_eq!(result, vec!["Nettle", "Tea"]);
    }

    #[tokio::test]
    async fn test_google_translator_flattens_embedded_newlines() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .and(query_param("q", "regel een regel twee\nandere"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(result_page("line one line two<br>other")),
            )
            .mount(&mock_server)
            .await;

        let translator = test_translator(&mock_server);
        let strings = vec!["regel een\nregel twee".to_string(), "andere".to_string()];

        let result = translator.translate(&strings, Language::En).await.expect("ok");
        assert_eq!(result, vec!["line one line two", "other"]);
    }

    #[tokio::test]
    async fn test_google_translator_line_mismatch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .respond_with(ResponseTemplate::new(200).set_body_string(result_page("Nettle tea")))
            .expect(1) // not retried
            .mount(&mock_server)
            .await;

        let translator = test_translator(&mock_server);
        let strings = vec!["Brandnetel".to_string(), "Thee".to_string()];

        let result = translator.translate(&strings, Language::En).await;
        assert!(matches!(
            result,
            Err(TranslationError::LineCountMismatch { sent: 2, received: 1 })
        ));
    }

    #[tokio::test]
    async fn test_google_translator_missing_payload_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = test_translator(&mock_server);
        let result = translator
            .translate(&["Thee".to_string()], Language::Sv)
            .await;

        assert!(matches!(result, Err(TranslationError::MissingPayload)));
    }

    #[tokio::test]
    async fn test_google_translator_retries_on_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .respond_with(ResponseTemplate::new(200).set_body_string(result_page("Te")))
            .mount(&mock_server)
            .await;

        let translator = test_translator(&mock_server);
        let result = translator
            .translate(&["Thee".to_string()], Language::Sv)
            .await;

        assert_eq!(result.expect("Should succeed after retry"), vec!["Te"]);
    }

    #[tokio::test]
    async fn test_google_translator_no_retry_on_400() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = test_translator(&mock_server);
        let result = translator
            .translate(&["Thee".to_string()], Language::En)
            .await;

        match result {
            Err(TranslationError::Status { status, .. }) => assert_eq!(status, 400),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_google_translator_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/m"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(result_page("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let translator =
            GoogleMobileTranslator::new(&format!("{}/m", mock_server.uri()), Duration::from_millis(50))
                .expect("client")
                .with_retry(RetryConfig::new(2, Duration::from_millis(10)));

        let result = translator
            .translate(&["laat".to_string()], Language::En)
            .await;

        assert!(matches!(result, Err(TranslationError::Transport(_))));
    }
}
