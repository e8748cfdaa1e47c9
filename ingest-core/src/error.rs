use thiserror::Error;

/// Why a single city's fetch produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connectivity failure or an elapsed request deadline.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider responded with status {status}: {body}")]
    Provider { status: u16, body: String },

    /// A success response that is not a current-conditions document.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    /// Transient failures are expected to clear up by the next cycle.
    ///
    /// 4xx statuses other than 408/429 point at client misconfiguration
    /// (bad key, bad coordinates) and will keep failing until someone fixes it.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Provider { status, .. } => {
                !(400..500).contains(status) || *status == 408 || *status == 429
            }
            FetchError::MalformedPayload(_) => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Provider { .. } => "provider",
            FetchError::MalformedPayload(_) => "malformed_payload",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    /// The request URL carries the API key, so it is stripped from the message.
    fn from(err: reqwest::Error) -> Self {
        let timed_out = err.is_timeout();
        let err = err.without_url();
        if timed_out {
            FetchError::Transport(format!("request timed out: {err}"))
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Failure of a whole batch write. No rows of the batch are visible afterwards.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not reach the warehouse: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("failed to provision table `{table}`: {source}")]
    Provision {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to insert row for {city}: {source}")]
    Write {
        city: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to commit batch of {rows} rows: {source}")]
    Commit {
        rows: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to emit batch: {0}")]
    Emit(#[from] std::io::Error),
}

/// Cut provider bodies down to something that fits in a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
