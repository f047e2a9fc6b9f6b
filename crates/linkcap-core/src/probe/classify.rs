//! Classify probe results into link states.

use thiserror::Error;

use crate::extract::LinkStatus;

/// Transport failure of a probe or refresh request. All of these are
/// retryable by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("transfer failed: {0}")]
    Other(String),
}

impl ProbeFailure {
    pub(crate) fn from_curl(e: curl::Error) -> Self {
        let text = e.to_string();
        if e.is_operation_timedout() {
            return ProbeFailure::Timeout(text);
        }
        if e.is_couldnt_connect()
            || e.is_couldnt_resolve_host()
            || e.is_couldnt_resolve_proxy()
            || e.is_read_error()
            || e.is_recv_error()
            || e.is_send_error()
            || e.is_got_nothing()
            || e.is_ssl_connect_error()
        {
            return ProbeFailure::Connection(text);
        }
        if e.is_url_malformed() || e.is_unsupported_protocol() {
            return ProbeFailure::InvalidUrl(text);
        }
        ProbeFailure::Other(text)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeFailure::Timeout(_))
    }
}

/// Map a final HTTP status to a link state.
pub fn classify_status(code: u32) -> LinkStatus {
    match code {
        200 => LinkStatus::Valid,
        403 => LinkStatus::Expired,
        404 => LinkStatus::NotFound,
        _ => LinkStatus::Indeterminate,
    }
}
