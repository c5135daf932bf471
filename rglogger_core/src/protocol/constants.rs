/**
 * Reporter-wide constants.
 *
 * The client triple is baked into every report and identifies this SDK to
 * the ingestion API. The dashboard keys syntax highlighting off the client
 * name, so it must stay stable across releases.
 */

/// Client name sent in `details.client.name` and as the `User-Agent` header.
pub const CLIENT_NAME: &str = "rglogger";

/// Client version, taken from the `rglogger_core` package version at compile time.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project URL sent in `details.client.clientUrl`.
pub const CLIENT_URL: &str = "https://github.com/mirusresearch/raygun-logger";

/// Public ingestion endpoint used when `Options::endpoint` is left at its default.
pub const DEFAULT_ENDPOINT: &str = "https://api.raygun.io/entries";

/// Header carrying the application API key.
pub const API_KEY_HEADER: &str = "X-ApiKey";

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "RGLOGGER_API_KEY";

/// Version label sent when the application did not configure one.
pub const UNDEFINED_VERSION: &str = "Not defined";
