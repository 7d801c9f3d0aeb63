//! Vendor service lookups over HTTP

use crate::credentials::Credentials;
use crate::error::LookupError;
use async_trait::async_trait;
use patcher_types::{LookupConfig, Tenant};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const GLOBAL_ENTITY_HEADER: &str = "X-Global-Entity-ID";
const USERNAME_HEADER: &str = "X-Pandora-Username";
const PERSEUS_CLIENT_HEADER: &str = "Perseus-Client-Id";
const PERSEUS_SESSION_HEADER: &str = "Perseus-Session-Id";
const NO_USER_INTERACTION: &str = "no-user-interaction";
const MAX_BODY_IN_ERROR: usize = 256;

/// Read access to the authoritative vendor attribute source
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Check credentials before any lookup is attempted
    ///
    /// # Errors
    /// `LookupError::MissingCredential` naming what is missing
    fn validate_readiness(&self) -> Result<(), LookupError>;

    /// Fetch the local legal name of one vendor
    ///
    /// `Ok(None)` when the service has no value for the vendor.
    async fn lookup(&self, tenant: &Tenant, code: &str) -> Result<Option<String>, LookupError>;
}

#[derive(Debug, Deserialize)]
struct VendorResponse {
    #[serde(default)]
    account_name_localized: Option<String>,
}

/// [`LookupClient`] backed by the vendor service REST API
#[derive(Clone)]
pub struct VendorServiceClient {
    http: reqwest::Client,
    config: LookupConfig,
    credentials: Credentials,
}

impl VendorServiceClient {
    /// Build a client with the configured request timeout
    ///
    /// # Errors
    /// `LookupError::Client` if the HTTP client cannot be constructed
    pub fn new(config: &LookupConfig, credentials: Credentials) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            http,
            config: config.clone(),
            credentials,
        })
    }
}

impl VendorServiceClient {
    /// Vendor URL with the code appended as one escaped path segment
    fn vendor_url(&self, tenant: &Tenant, code: &str) -> Result<Url, LookupError> {
        let endpoint_error = |message: String| LookupError::Endpoint {
            code: code.to_string(),
            message,
        };

        let mut url = Url::parse(&self.config.endpoint_base(tenant.country_code()))
            .map_err(|e| endpoint_error(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| endpoint_error("endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(code);
        Ok(url)
    }
}

impl fmt::Debug for VendorServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorServiceClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LookupClient for VendorServiceClient {
    fn validate_readiness(&self) -> Result<(), LookupError> {
        self.credentials.validate()
    }

    async fn lookup(&self, tenant: &Tenant, code: &str) -> Result<Option<String>, LookupError> {
        let url = self.vendor_url(tenant, code)?;
        tracing::trace!(tenant = %tenant, vendor_code = code, %url, "looking up vendor");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credentials.service_token()),
            )
            .header(GLOBAL_ENTITY_HEADER, tenant.id())
            .header(USERNAME_HEADER, self.credentials.operator_email())
            .header(PERSEUS_CLIENT_HEADER, NO_USER_INTERACTION)
            .header(PERSEUS_SESSION_HEADER, NO_USER_INTERACTION)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable {
                code: code.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| LookupError::Unavailable {
            code: code.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let mut body = String::from_utf8_lossy(&body).into_owned();
            if body.len() > MAX_BODY_IN_ERROR {
                let cut = (0..=MAX_BODY_IN_ERROR)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(LookupError::Rejected {
                code: code.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: VendorResponse =
            serde_json::from_slice(&body).map_err(|e| LookupError::Decode {
                code: code.to_string(),
                message: e.to_string(),
            })?;

        Ok(parsed
            .account_name_localized
            .filter(|name| !name.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{OPERATOR_EMAIL_VAR, SERVICE_TOKEN_VAR};
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use warp::http::{HeaderMap, StatusCode};
    use warp::Filter;
    use warp::Reply;

    type Seen = Arc<Mutex<Vec<(String, HeaderMap)>>>;

    fn respond(code: &str) -> warp::reply::Response {
        match code {
            "v-ok" => warp::reply::json(&serde_json::json!({
                "account_name_localized": "Legal A",
                "name": "Shop A",
            }))
            .into_response(),
            "v-empty" => warp::reply::json(&serde_json::json!({ "account_name_localized": "" }))
                .into_response(),
            "v-null" => warp::reply::json(&serde_json::json!({ "account_name_localized": null }))
                .into_response(),
            "v-missing" => warp::reply::json(&serde_json::json!({ "name": "Shop" })).into_response(),
            "v-bad" => warp::reply::with_status("<html>oops</html>", StatusCode::OK).into_response(),
            "v-busy" => {
                warp::reply::with_status("slow down", StatusCode::TOO_MANY_REQUESTS).into_response()
            }
            _ => warp::reply::with_status("vendor not found", StatusCode::NOT_FOUND).into_response(),
        }
    }

    /// Fake vendor service at `/{country}/vendors/{code}` recording each request
    async fn fake_vendor_service() -> (SocketAddr, Seen) {
        let seen: Seen = Arc::default();
        let log = seen.clone();

        let route = warp::path!(String / "vendors" / String)
            .and(warp::get())
            .and(warp::header::headers_cloned())
            .and_then(move |country: String, code: String, headers: HeaderMap| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push((format!("{country}/{code}"), headers));
                    if code == "v-slow" {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                    }
                    Ok::<_, Infallible>(respond(&code))
                }
            });

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        (addr, seen)
    }

    fn client_for(addr: SocketAddr, timeout_secs: u64) -> VendorServiceClient {
        let config = LookupConfig {
            endpoint_template: format!("http://{addr}/{{country}}/vendors/{{vendor}}"),
            timeout_secs,
        };
        VendorServiceClient::new(&config, Credentials::new("tok-123", "ops@example.com")).unwrap()
    }

    fn singapore() -> Tenant {
        Tenant::new("FP_SG").unwrap()
    }

    #[tokio::test]
    async fn returns_localized_account_name() {
        let (addr, seen) = fake_vendor_service().await;
        let client = client_for(addr, 5);

        let name = client.lookup(&singapore(), "v-ok").await.unwrap();

        assert_eq!(name.as_deref(), Some("Legal A"));
        assert_eq!(seen.lock().unwrap()[0].0, "sg/v-ok");
    }

    #[tokio::test]
    async fn sends_identity_and_service_headers() {
        let (addr, seen) = fake_vendor_service().await;
        let client = client_for(addr, 5);

        client.lookup(&singapore(), "v-ok").await.unwrap();

        let seen = seen.lock().unwrap();
        let headers = &seen[0].1;
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("");
        assert_eq!(header("accept"), "application/json");
        assert_eq!(header("authorization"), "Bearer tok-123");
        assert_eq!(header("x-global-entity-id"), "FP_SG");
        assert_eq!(header("x-pandora-username"), "ops@example.com");
        assert_eq!(header("perseus-client-id"), "no-user-interaction");
        assert_eq!(header("perseus-session-id"), "no-user-interaction");
    }

    #[tokio::test]
    async fn empty_null_or_missing_field_is_no_data() {
        let (addr, _) = fake_vendor_service().await;
        let client = client_for(addr, 5);

        for code in ["v-empty", "v-null", "v-missing"] {
            assert_eq!(client.lookup(&singapore(), code).await.unwrap(), None, "{code}");
        }
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (addr, _) = fake_vendor_service().await;
        let client = client_for(addr, 5);

        let err = client.lookup(&singapore(), "v-gone").await.unwrap_err();
        assert_eq!(
            err,
            LookupError::Rejected {
                code: "v-gone".to_string(),
                status: 404,
                body: "vendor not found".to_string(),
            }
        );
        assert!(!err.is_retryable());

        let err = client.lookup(&singapore(), "v-busy").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_payload_is_decode_error() {
        let (addr, _) = fake_vendor_service().await;
        let client = client_for(addr, 5);

        let err = client.lookup(&singapore(), "v-bad").await.unwrap_err();
        assert!(matches!(err, LookupError::Decode { code, .. } if code == "v-bad"));
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(addr, 5);

        let err = client.lookup(&singapore(), "v-ok").await.unwrap_err();
        assert!(matches!(err, LookupError::Unavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn slow_service_times_out_as_unavailable() {
        let (addr, _) = fake_vendor_service().await;
        let client = client_for(addr, 1);

        let err = client.lookup(&singapore(), "v-slow").await.unwrap_err();
        assert!(matches!(err, LookupError::Unavailable { .. }));
    }

    #[test]
    fn vendor_code_is_escaped_as_one_path_segment() {
        let addr: SocketAddr = ([127, 0, 0, 1], 8080).into();
        let client = client_for(addr, 5);

        let url = client.vendor_url(&singapore(), "a/b?c#d").unwrap();

        assert_eq!(url.as_str(), "http://127.0.0.1:8080/sg/vendors/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn relative_endpoint_is_rejected_per_vendor() {
        let config = LookupConfig {
            endpoint_template: "/{country}/vendors/{vendor}".to_string(),
            timeout_secs: 1,
        };
        let client =
            VendorServiceClient::new(&config, Credentials::new("tok", "ops@example.com")).unwrap();

        let err = client.vendor_url(&singapore(), "v1").unwrap_err();
        assert!(matches!(err, LookupError::Endpoint { code, .. } if code == "v1"));
    }

    #[test]
    fn readiness_requires_both_credentials() {
        let config = LookupConfig {
            endpoint_template: "http://localhost/{country}/vendors/{vendor}".to_string(),
            timeout_secs: 1,
        };

        let ready = VendorServiceClient::new(&config, Credentials::new("tok", "ops@example.com"))
            .unwrap();
        assert!(ready.validate_readiness().is_ok());

        let no_email = VendorServiceClient::new(&config, Credentials::new("tok", "")).unwrap();
        assert_eq!(
            no_email.validate_readiness(),
            Err(LookupError::MissingCredential(OPERATOR_EMAIL_VAR))
        );

        let nothing = VendorServiceClient::new(&config, Credentials::default()).unwrap();
        assert_eq!(
            nothing.validate_readiness(),
            Err(LookupError::MissingCredential(SERVICE_TOKEN_VAR))
        );
    }
}
