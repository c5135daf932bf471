/*!
 * HTTP transport for delivering reports to the ingestion endpoint.
 *
 * Uses `ureq`, a pure-Rust blocking HTTP client with no async runtime.
 * Reports are sent on the caller's thread, so a blocking client is all we
 * need.
 *
 * Design decisions:
 * - **Blocking, bounded**: one global timeout covers connect, send and
 *   receive.
 * - **Errors surface**: network failures and timeouts are returned to the
 *   caller as `Error::Transport`.
 * - **Status is not interpreted**: non-2xx responses are returned as-is;
 *   whether to retry or ignore them is the caller's call.
 * - **Single attempt**: no retries.
 */

use std::time::Duration;

use ureq::Agent;

use crate::error::Error;
use crate::protocol::constants::{API_KEY_HEADER, CLIENT_NAME};
use crate::protocol::types::ReportDocument;

/// Raw response handed back to the caller.
pub type Response = ureq::http::Response<ureq::Body>;

/**
 * Thin wrapper around `ureq::Agent`.
 *
 * Created once per `Reporter`; the agent pools connections internally.
 */
#[derive(Clone)]
pub struct Transport {
    agent: Agent,
}

impl Transport {
    /**
     * Creates a transport whose requests give up after `timeout`.
     *
     * `http_status_as_error(false)` keeps 4xx/5xx responses out of the
     * error path.
     */
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }

    /**
     * POSTs `report` as JSON to `endpoint`.
     *
     * Headers: the API key, `Content-Type: application/json` and the
     * client name as `User-Agent`.
     */
    pub fn send(&self, endpoint: &str, api_key: &str, report: &ReportDocument) -> Result<Response, Error> {
        let body = serde_json::to_vec(report)?;

        tracing::debug!(endpoint, bytes = body.len(), "sending report");

        let response = self
            .agent
            .post(endpoint)
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", "application/json")
            .header("User-Agent", CLIENT_NAME)
            .send(&body[..])?;

        tracing::debug!(status = response.status().as_u16(), "report delivered");

        Ok(response)
    }
}
