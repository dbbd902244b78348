//! Parses the refresh dump produced by the Automation Adapter's `refresh`
//! operation.

use crate::error::Error;
use crate::models::RefreshDump;
use crate::Result;

/// Parses a refresh dump's JSON document and checks its top-level status.
///
/// A `status: "error"` document is not a parse failure — it's a
/// successfully-reported extraction failure — so this returns the parsed
/// [`RefreshDump`] either way; callers inspect `.status` to decide whether
/// there is a `data` payload to ingest.
pub fn parse_dump(raw: &str) -> Result<RefreshDump> {
    serde_json::from_str(raw)
        .map_err(|e| Error::InvalidArgument(format!("malformed refresh dump: {e}")))
}
