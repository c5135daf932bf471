/**
 * Wire types for the report document.
 *
 * These structures mirror the JSON accepted by the Raygun `entries` API.
 * The outermost value is `ReportDocument`:
 * `{ occurredOn, details: { version, tags, machineName, environment, client,
 * error, request, user, userCustomData } }`.
 *
 * Absent values are sent as explicit `null` rather than skipped; the
 * endpoint expects every key to be present.
 */
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::constants::{CLIENT_NAME, CLIENT_URL, CLIENT_VERSION};
use crate::request::RequestDetails;

// ---------------------------------------------------------------------------
// ReportDocument: the top-level structure POSTed to the endpoint
// ---------------------------------------------------------------------------

/**
 * A single report, built fresh per capture and discarded after sending.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    /// ISO-8601 UTC timestamp of the capture.
    pub occurred_on: String,

    pub details: Details,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    /// Release label, or `"Not defined"`.
    pub version: String,

    /// Effective tags; `None` when the list ended up empty.
    pub tags: Option<Vec<String>>,

    pub machine_name: Option<String>,

    /// Base environment snapshot with per-call extras merged on top.
    pub environment: Map<String, Value>,

    pub client: ClientInfo,

    pub error: ErrorDetails,

    pub request: Option<RequestDetails>,

    /// Opaque caller-supplied user identity.
    pub user: Option<Value>,

    pub user_custom_data: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// ClientInfo
// ---------------------------------------------------------------------------

/**
 * The fixed name/version/URL triple identifying this SDK.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
    pub client_url: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: CLIENT_NAME.to_string(),
            version: CLIENT_VERSION.to_string(),
            client_url: CLIENT_URL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorDetails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Error class, e.g. `"RuntimeError"`, `"panic"` or a log level like `"ERROR"`.
    pub class_name: String,

    pub message: String,

    /// Frames from the oldest call to the failure site.
    pub stack_trace: Vec<FrameDetails>,

    /// Projected global namespace of the outermost frame.
    pub global_variables: BTreeMap<String, String>,

    /// Reserved by the API; always sent as an empty string.
    pub data: String,
}

// ---------------------------------------------------------------------------
// FrameDetails
// ---------------------------------------------------------------------------

/**
 * One stack level as it appears on the wire.
 *
 * `local_variables` is `None` when locals capture is disabled or the frame
 * had no bindings to report.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDetails {
    pub line_number: Option<u32>,

    /// Enclosing scope: the module path or `impl` target of the function.
    pub class_name: Option<String>,

    pub file_name: Option<String>,

    pub method_name: Option<String>,

    pub local_variables: Option<BTreeMap<String, String>>,
}
