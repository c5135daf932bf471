/**
 * Transport layer: how reports reach the endpoint.
 *
 * - `http`: ureq-based blocking POST with a bounded timeout
 */

pub mod http;

pub use http::{Response, Transport};
