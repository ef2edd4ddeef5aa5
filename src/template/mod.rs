//! Remote template catalog with endpoint fallback and a session cache.

use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.memegen.link/templates/",
    "https://memegen.link/api/templates/",
];

const ACCEPT_JSON: &str = "application/json";
const ACCEPT_IMAGE: &str = "image/*";
const USER_AGENT: &str = concat!("memegen/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub blank: String,
    pub example: Option<String>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Request failed ({0})")]
    RequestFailed(u16),
    #[error("Image request failed ({0})")]
    ImageRequestFailed(u16),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Unexpected API response")]
    UnexpectedResponse,
    #[error("No templates returned")]
    NoTemplates,
    #[error("no template endpoints configured")]
    NoEndpoints,
}

pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

impl From<reqwest::Error> for TemplateError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam for the catalog so tests can run without the network.
pub trait CatalogClient: Send + Sync {
    fn get(&self, url: &str, accept: &str) -> TemplateResult<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::blocking::Client,
}

impl HttpCatalogClient {
    pub fn new() -> TemplateResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl CatalogClient for HttpCatalogClient {
    fn get(&self, url: &str, accept: &str) -> TemplateResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<serde_json::Value>,
    #[serde(default)]
    blank: Option<String>,
    #[serde(default)]
    example: Option<serde_json::Value>,
}

impl CatalogEntry {
    fn into_template(self) -> Option<Template> {
        let id = catalog_label(self.id)?;
        let blank = self.blank.filter(|blank| !blank.is_empty())?;
        let name = catalog_label(self.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| id.clone());
        let example = match self.example {
            Some(serde_json::Value::String(url)) => Some(url),
            Some(serde_json::Value::Object(fields)) => fields
                .get("url")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        Some(Template {
            id,
            name,
            blank,
            example,
        })
    }
}

/// Catalogs use both string and numeric ids. Empty strings and zero count as missing.
fn catalog_label(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(text) if !text.is_empty() => Some(text),
        serde_json::Value::Number(number) if number.as_f64() != Some(0.0) => {
            Some(number.to_string())
        }
        _ => None,
    }
}

fn parse_catalog(body: &[u8]) -> TemplateResult<Vec<Template>> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| TemplateError::UnexpectedResponse)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(TemplateError::UnexpectedResponse);
    };
    let templates = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<CatalogEntry>(entry).ok())
        .filter_map(CatalogEntry::into_template)
        .collect::<Vec<_>>();
    if templates.is_empty() {
        return Err(TemplateError::NoTemplates);
    }
    Ok(templates)
}

/// Catalog fetcher. The first successful list is kept until `invalidate`.
pub struct TemplateSource {
    client: Box<dyn CatalogClient>,
    endpoints: Vec<String>,
    cache: Mutex<Option<Vec<Template>>>,
}

impl std::fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSource")
            .field("endpoints", &self.endpoints)
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl TemplateSource {
    pub fn new(client: Box<dyn CatalogClient>, endpoints: Vec<String>) -> Self {
        Self {
            client,
            endpoints,
            cache: Mutex::new(None),
        }
    }

    pub fn with_default_endpoints(client: Box<dyn CatalogClient>) -> Self {
        Self::new(
            client,
            DEFAULT_ENDPOINTS.iter().map(|url| url.to_string()).collect(),
        )
    }

    fn cached_len(&self) -> Option<usize> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.as_ref().map(Vec::len))
    }

    /// Returns the cached list, or tries each endpoint in order.
    pub fn fetch_templates(&self) -> TemplateResult<Vec<Template>> {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(templates) = cache.as_ref() {
            return Ok(templates.clone());
        }

        let mut last_error = TemplateError::NoEndpoints;
        for endpoint in &self.endpoints {
            match self.fetch_endpoint(endpoint) {
                Ok(templates) => {
                    tracing::info!(%endpoint, count = templates.len(), "fetched template catalog");
                    *cache = Some(templates.clone());
                    return Ok(templates);
                }
                Err(err) => {
                    tracing::warn!(%endpoint, %err, "template endpoint failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    fn fetch_endpoint(&self, endpoint: &str) -> TemplateResult<Vec<Template>> {
        let response = self.client.get(endpoint, ACCEPT_JSON)?;
        if !response.is_success() {
            return Err(TemplateError::RequestFailed(response.status));
        }
        parse_catalog(&response.body)
    }

    pub fn random_template(&self) -> TemplateResult<Template> {
        self.random_template_with(&mut rand::thread_rng())
    }

    pub fn random_template_with<R: Rng + ?Sized>(&self, rng: &mut R) -> TemplateResult<Template> {
        let templates = self.fetch_templates()?;
        templates
            .choose(rng)
            .cloned()
            .ok_or(TemplateError::NoTemplates)
    }

    pub fn fetch_image_bytes(&self, url: &str) -> TemplateResult<Vec<u8>> {
        let response = self.client.get(url, ACCEPT_IMAGE)?;
        if !response.is_success() {
            return Err(TemplateError::ImageRequestFailed(response.status));
        }
        Ok(response.body)
    }

    pub fn invalidate(&self) {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        if cache.take().is_some() {
            tracing::debug!("template cache cleared");
        }
    }
}


#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::test_support::FakeClient;
    use super::*;

    const FIRST: &str = "https://api.memegen.link/templates/";
    const SECOND: &str = "https://memegen.link/api/templates/";

    fn source(client: &FakeClient) -> TemplateSource {
        TemplateSource::with_default_endpoints(Box::new(client.clone()))
    }

    #[test]
    fn falls_back_to_next_endpoint_and_caches_the_result() {
        let client = FakeClient::default().with(FIRST, 200, "[]").with(
            SECOND,
            200,
            r#"[{"id":"x","name":"X","blank":"https://img/x.png"}]"#,
        );
        let source = source(&client);

        let templates = source.fetch_templates().expect("second endpoint succeeds");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "x");
        assert_eq!(templates[0].blank, "https://img/x.png");
        assert_eq!(client.call_count(), 2);

        let again = source.fetch_templates().expect("cached");
        assert_eq!(again, templates);
        assert_eq!(client.call_count(), 2);

        source.invalidate();
        source.fetch_templates().expect("refetch");
        assert_eq!(client.call_count(), 4);
    }

    #[test]
    fn entries_without_id_or_blank_are_discarded() {
        let body = r#"[
            {"id":"","blank":"https://img/a.png"},
            {"id":"b"},
            {"id":0,"blank":"https://img/zero.png"},
            {"id":null,"blank":"https://img/null.png"},
            {"id":7,"blank":"https://img/c.png"},
            {"id":"d","name":42,"blank":"https://img/d.png","example":{"url":"https://img/d-ex.png"}}
        ]"#;
        let client = FakeClient::default().with(FIRST, 200, body);
        let templates = source(&client).fetch_templates().expect("usable entries");
        assert_eq!(
            templates,
            vec![
                Template {
                    id: "7".to_string(),
                    name: "7".to_string(),
                    blank: "https://img/c.png".to_string(),
                    example: None,
                },
                Template {
                    id: "d".to_string(),
                    name: "42".to_string(),
                    blank: "https://img/d.png".to_string(),
                    example: Some("https://img/d-ex.png".to_string()),
                },
            ]
        );
    }

    #[test]
    fn all_endpoints_failing_surfaces_the_last_error() {
        let client = FakeClient::default()
            .with(FIRST, 503, "down")
            .with(SECOND, 200, r#"{"templates":[]}"#);
        let err = source(&client).fetch_templates().expect_err("both fail");
        assert!(matches!(err, TemplateError::UnexpectedResponse));
        assert_eq!(err.to_string(), "Unexpected API response");

        let client = FakeClient::default()
            .with(FIRST, 200, "[]")
            .with(SECOND, 404, "");
        let err = source(&client).fetch_templates().expect_err("both fail");
        assert_eq!(err.to_string(), "Request failed (404)");

        let source = TemplateSource::new(Box::new(FakeClient::default()), Vec::new());
        assert!(matches!(
            source.fetch_templates(),
            Err(TemplateError::NoEndpoints)
        ));
    }

    #[test]
    fn random_template_picks_from_the_catalog() {
        let body = r#"[
            {"id":"a","name":"A","blank":"https://img/a.png"},
            {"id":"b","name":"B","blank":"https://img/b.png"}
        ]"#;
        let client = FakeClient::default().with(FIRST, 200, body);
        let source = source(&client);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..8 {
            let template = source.random_template_with(&mut rng).expect("template");
            assert!(template.id == "a" || template.id == "b");
        }
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn image_bytes_report_status_failures() {
        let client = FakeClient::default()
            .with("https://img/a.png", 200, vec![1, 2, 3])
            .with("https://img/gone.png", 410, "");
        let source = source(&client);
        assert_eq!(
            source.fetch_image_bytes("https://img/a.png").expect("bytes"),
            vec![1, 2, 3]
        );
        let err = source
            .fetch_image_bytes("https://img/gone.png")
            .expect_err("status error");
        assert_eq!(err.to_string(), "Image request failed (410)");
    }
}
