//! FDIC BankFind remote client.
//!
//! Issues `institutions` and `financials` collection queries over blocking
//! HTTP. Certificate validation is relaxed by default because the client is
//! deployed behind proxies with broken TLS chains. Every transport failure is
//! logged and turned into an empty collection at the trait boundary.

use super::provider::{DataError, FinancialSource, Query, Resource};
use crate::config::ApiConfig;
use crate::domain::{DateWindow, EntityLookup};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Field list requested from the institutions endpoint.
pub const INSTITUTION_FIELDS: &str = "NAME,CERT";

/// Top-level response body of a collection query.
#[derive(Debug, Deserialize)]
struct CollectionResponse {
    data: Vec<Value>,
}

/// Remote client for the FDIC API.
pub struct FdicClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl FdicClient {
    pub fn new(config: &ApiConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(concat!("peerbank/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }

    /// Execute one query. Errors are returned to the caller.
    pub fn try_fetch(&self, resource: Resource, query: &Query) -> Result<Vec<Value>, DataError> {
        let url = self.endpoint_url(resource);
        let limit = query.limit.to_string();

        debug!(%resource, filter = %query.filter, "querying collection");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("filters", query.filter.as_str()),
                ("fields", query.fields.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body: CollectionResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse {resource} response: {e}"))
        })?;

        Ok(body.data)
    }
}

impl FinancialSource for FdicClient {
    fn name(&self) -> &str {
        "fdic_bankfind"
    }

    fn fetch_collection(&self, resource: Resource, query: &Query) -> Vec<Value> {
        match self.try_fetch(resource, query) {
            Ok(data) => data,
            Err(e) => {
                error!(%resource, filter = %query.filter, error = %e, "API request failed");
                Vec::new()
            }
        }
    }
}

// ── Query construction ──────────────────────────────────────────────

/// Institution filter: exact quoted name, or certificate number.
pub fn institution_filter(lookup: &EntityLookup<'_>) -> String {
    match lookup {
        EntityLookup::Cert(cert) => format!("CERT:{cert}"),
        EntityLookup::Name(name) => format!("NAME:\"{}\"", name.replace('"', "\\\"")),
    }
}

/// Financials filter: certificate, optionally conjoined with an inclusive
/// report-date range.
pub fn financials_filter(cert: &str, window: Option<&DateWindow>) -> String {
    match window {
        Some(w) => format!(
            "CERT:{cert} AND REPDTE:[{} TO {}]",
            w.start_key(),
            w.end_key()
        ),
        None => format!("CERT:{cert}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn institution_filter_by_cert_and_name() {
        assert_eq!(institution_filter(&EntityLookup::Cert("628")), "CERT:628");
        assert_eq!(
            institution_filter(&EntityLookup::Name("Truist Bank")),
            r#"NAME:"Truist Bank""#
        );
    }

    #[test]
    fn financials_filter_with_window() {
        let w = DateWindow::parse("20000331", "20250331").unwrap();
        assert_eq!(
            financials_filter("33124", Some(&w)),
            "CERT:33124 AND REPDTE:[20000331 TO 20250331]"
        );
        assert_eq!(financials_filter("33124", None), "CERT:33124");
    }

    #[test]
    fn endpoint_urls_strip_trailing_slash() {
        let cfg = ApiConfig {
            base_url: "https://example.test/api/".into(),
            ..ApiConfig::default()
        };
        let client = FdicClient::new(&cfg).unwrap();
        assert_eq!(
            client.endpoint_url(Resource::Financials),
            "https://example.test/api/financials"
        );
    }

    #[test]
    fn unreachable_host_yields_empty_collection() {
        let cfg = ApiConfig {
            base_url: "http://127.0.0.1:9/api".into(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let client = FdicClient::new(&cfg).unwrap();
        let query = Query {
            filter: "CERT:628".into(),
            fields: INSTITUTION_FIELDS.into(),
            limit: 1,
        };
        assert!(client.try_fetch(Resource::Institutions, &query).is_err());
        assert!(client
            .fetch_collection(Resource::Institutions, &query)
            .is_empty());
    }
}
