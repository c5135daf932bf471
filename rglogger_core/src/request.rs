/**
 * Request details: what a report says about the web request being served.
 *
 * The reporter is not tied to any framework. Anything implementing
 * `RequestLike` can be bound as the `request` local of a frame (or turned
 * into `RequestDetails` up front); `http::Request<B>` implements it out of
 * the box.
 */
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// IP address reported when the request does not expose one.
pub const UNKNOWN_IP: &str = "?";

// ---------------------------------------------------------------------------
// RequestLike
// ---------------------------------------------------------------------------

/**
 * Accessors the reporter needs from a web request.
 *
 * Multi-valued collections are returned as pairs in arrival order; the
 * reporter keeps the first value of each key.
 */
pub trait RequestLike: fmt::Debug + Send + Sync {
    fn host(&self) -> String;

    fn path(&self) -> String;

    fn method(&self) -> String;

    fn remote_addr(&self) -> Option<String> {
        None
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn form_pairs(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn header_pairs(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn body(&self) -> Option<Vec<u8>> {
        None
    }
}

// ---------------------------------------------------------------------------
// RequestDetails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub host_name: String,
    pub url: String,
    pub http_method: String,
    pub ip_address: String,
    pub query_string: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,

    /// Body as UTF-8, or standard base64 when it is not valid UTF-8.
    pub raw_data: String,
}

impl RequestDetails {
    pub fn from_request(request: &dyn RequestLike) -> Self {
        Self {
            host_name: request.host(),
            url: request.path(),
            http_method: request.method(),
            ip_address: request
                .remote_addr()
                .unwrap_or_else(|| UNKNOWN_IP.to_string()),
            query_string: first_values(request.query_pairs()),
            form: first_values(request.form_pairs()),
            headers: first_values(request.header_pairs()),
            raw_data: request.body().map(encode_body).unwrap_or_default(),
        }
    }
}

fn first_values(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (key, value) in pairs {
        map.entry(key).or_insert(value);
    }
    map
}

fn encode_body(body: Vec<u8>) -> String {
    match String::from_utf8(body) {
        Ok(text) => text,
        Err(err) => base64::engine::general_purpose::STANDARD.encode(err.as_bytes()),
    }
}

// ---------------------------------------------------------------------------
// http::Request
// ---------------------------------------------------------------------------

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/**
 * Requests from any `http`-based server stack.
 *
 * The client IP is read from a `SocketAddr` request extension, which is
 * where hyper/axum-style servers usually stash the peer address.
 */
impl<B> RequestLike for http::Request<B>
where
    B: AsRef<[u8]> + fmt::Debug + Send + Sync,
{
    fn host(&self) -> String {
        self.headers()
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default()
    }

    fn path(&self) -> String {
        self.uri().path().to_string()
    }

    fn method(&self) -> String {
        http::Request::method(self).as_str().to_string()
    }

    fn remote_addr(&self) -> Option<String> {
        self.extensions()
            .get::<SocketAddr>()
            .map(|addr| addr.ip().to_string())
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.uri()
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    }

    fn form_pairs(&self) -> Vec<(String, String)> {
        let is_form = self
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

        if !is_form {
            return Vec::new();
        }
        url::form_urlencoded::parse(http::Request::body(self).as_ref())
            .into_owned()
            .collect()
    }

    fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    fn body(&self) -> Option<Vec<u8>> {
        Some(http::Request::body(self).as_ref().to_vec())
    }
}
