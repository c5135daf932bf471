/*!
 * Protocol layer: the report document and its constants.
 *
 * Everything related to *what* we send to the ingestion endpoint:
 * - `types`: ReportDocument, Details, ErrorDetails, FrameDetails, ClientInfo
 * - `constants`: client identity, default endpoint, header names
 */

pub mod constants;
pub mod types;
