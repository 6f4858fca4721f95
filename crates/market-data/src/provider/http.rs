//! HTTP transport shared by the provider adapters.

use std::collections::BTreeMap;

use reqwest::Client;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::ProviderSettings;

use super::traits::FetchRequest;

/// One provider's HTTP client, bound to its endpoint and timeout.
pub(crate) struct ProviderHttp {
    provider: &'static str,
    client: Client,
    settings: ProviderSettings,
}

impl ProviderHttp {
    /// Build the client. Fails rather than fall back to a client without the timeout.
    pub(crate) fn new(
        provider: &'static str,
        settings: ProviderSettings,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| MarketDataError::ClientInit {
                provider: provider.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            provider,
            client,
            settings,
        })
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        self.settings.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Merge query parameters: adapter defaults, then configured params,
    /// then per-request params. Later layers win on key clashes.
    pub(crate) fn build_query(
        &self,
        defaults: &[(&str, String)],
        request: &FetchRequest,
    ) -> Vec<(String, String)> {
        let mut query: BTreeMap<String, String> = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        query.extend(self.settings.params.clone());
        query.extend(request.params.clone());
        query.into_iter().collect()
    }

    /// GET the market endpoint and return the body of a successful response.
    ///
    /// Any non-success status becomes `UpstreamHttp` carrying the code.
    pub(crate) async fn get_text(
        &self,
        query: &[(String, String)],
        headers: &[(&str, String)],
    ) -> Result<String, MarketDataError> {
        let url = self.settings.endpoint();

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        debug!(
            "{} request: {} with {} params",
            self.provider,
            url,
            query.len()
        );

        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::UpstreamHttp {
                provider: self.provider.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::from_transport(self.provider, e))
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{serve_once, serve_silent};
    use super::*;

    #[test]
    fn test_query_layers_override_in_order() {
        let mut settings = ProviderSettings::new("https://example.test", "/markets");
        settings.params.insert("limit".to_string(), "50".to_string());
        settings.params.insert("aux".to_string(), "tags".to_string());
        let http = ProviderHttp::new("TEST", settings).unwrap();

        let request = FetchRequest::for_currency("usd").with_param("aux", "none");
        let query = http.build_query(
            &[("convert", "USD".to_string()), ("limit", "100".to_string())],
            &request,
        );

        assert_eq!(
            query,
            vec![
                ("aux".to_string(), "none".to_string()),
                ("convert".to_string(), "USD".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let settings = ProviderSettings::new("https://example.test", "/markets").with_api_key("");
        let http = ProviderHttp::new("TEST", settings).unwrap();
        assert!(http.api_key().is_none());
    }

    fn settings_for(base_url: &str) -> ProviderSettings {
        let mut settings = ProviderSettings::new(base_url, "/markets");
        settings.timeout_secs = 1;
        settings
    }

    #[tokio::test]
    async fn test_get_text_sends_query_and_headers() {
        let server = serve_once(200, r#"[]"#).await;
        let http = ProviderHttp::new("TEST", settings_for(&server.base_url)).unwrap();

        let body = http
            .get_text(
                &[("a".to_string(), "b".to_string())],
                &[("X-CMC_PRO_API_KEY", "k".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(body, "[]");

        let request = server.request().await;
        assert_eq!(request.line, "GET /markets?a=b HTTP/1.1");
        assert_eq!(request.header("x-cmc_pro_api_key"), Some("k"));
    }

    #[tokio::test]
    async fn test_error_status_becomes_upstream_http() {
        let server = serve_once(500, "oops").await;
        let http = ProviderHttp::new("TEST", settings_for(&server.base_url)).unwrap();

        let err = http.get_text(&[], &[]).await.unwrap_err();
        assert!(matches!(
            err,
            MarketDataError::UpstreamHttp { ref provider, status: 500 } if provider == "TEST"
        ));
        assert_eq!(err.retry_class(), crate::errors::RetryClass::WithBackoff);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = serve_once(401, "").await;
        let http = ProviderHttp::new("TEST", settings_for(&server.base_url)).unwrap();

        let err = http.get_text(&[], &[]).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UpstreamHttp { status: 401, .. }));
        assert_eq!(err.retry_class(), crate::errors::RetryClass::Never);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let base_url = serve_silent().await;
        let http = ProviderHttp::new("TEST", settings_for(&base_url)).unwrap();

        let err = http.get_text(&[], &[]).await.unwrap_err();
        assert!(matches!(err, MarketDataError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let http = ProviderHttp::new("TEST", settings_for(&base_url)).unwrap();
        let err = http.get_text(&[], &[]).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UpstreamTransport { .. }));
    }
}
