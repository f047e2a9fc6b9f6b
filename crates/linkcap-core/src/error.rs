//! Hard-failure error types.
//!
//! Recoverable conditions (unparsable payloads, 403/404 probes, timeouts) are
//! carried as data by the components that meet them; only conditions the
//! caller must decide about are errors.

use std::io;
use std::path::PathBuf;

/// Failure of the exchange store's backing log.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("open exchange log {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("append to exchange log {}: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serialize exchange record: {0}")]
    Serialize(#[from] serde_json::Error),
}
