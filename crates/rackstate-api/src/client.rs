// NetBox HTTP client
//
// Wraps `reqwest::Client` with NetBox-specific URL construction, token
// authentication, list-envelope unwrapping and pagination. Endpoint
// families (dcim, extras, tenancy) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::Page;

/// Page size used when walking list endpoints.
const PAGE_LIMIT: u32 = 100;

/// Error body shape NetBox returns on 4xx: `{"detail": "..."}` or a
/// field -> messages map for validation failures.
#[derive(serde::Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

/// Async client for the NetBox REST API.
///
/// All paths are relative to `{base}/api/` (e.g. `"dcim/devices/"`).
pub struct NetboxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetboxClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a NetBox URL and API token.
    ///
    /// Injects `Authorization: Token <token>` as a sensitive default header.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The API root (always ends with `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Accept `https://netbox`, `https://netbox/` or `https://netbox/api`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        offset: u32,
    ) -> Result<Page<T>, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?} offset={offset}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .query(&[("limit", PAGE_LIMIT), ("offset", offset)])
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Collect every page of a filtered list endpoint.
    pub(crate) async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let mut all = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let page: Page<T> = self.list_page(path, params, offset).await?;
            let received = u32::try_from(page.results.len()).unwrap_or(u32::MAX);
            all.extend(page.results);

            if page.next.is_none()
                || received == 0
                || u64::try_from(all.len()).unwrap_or(u64::MAX) >= page.count
            {
                break;
            }
            offset = offset.saturating_add(received);
        }

        Ok(all)
    }

    /// Single-object lookup by filter. `Ok(None)` when nothing matches,
    /// `Error::MultipleResults` when the filter is ambiguous.
    pub(crate) async fn get_one<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, Error> {
        let page: Page<T> = self.list_page(path, params, 0).await?;
        if page.count > 1 || page.results.len() > 1 {
            return Err(Error::MultipleResults {
                endpoint: path.to_owned(),
            });
        }
        Ok(page.results.into_iter().next())
    }

    /// Fetch a record by ID. A 404 maps to `Ok(None)`.
    pub(crate) async fn get_by_id<T: DeserializeOwned>(
        &self,
        path: &str,
        id: u64,
    ) -> Result<Option<T>, Error> {
        let url = self.url(&format!("{path}{id}/"))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        match self.handle_response(resp).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        id: u64,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(&format!("{path}{id}/"))?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str, id: u64) -> Result<(), Error> {
        let url = self.url(&format!("{path}{id}/"))?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorDetail>(&raw)
            .ok()
            .and_then(|d| d.detail);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: detail.unwrap_or_else(|| format!("HTTP {status}")),
            };
        }

        Error::Api {
            status: status.as_u16(),
            message: detail.unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            }),
        }
    }
}
