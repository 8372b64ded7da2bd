use std::time::Duration;

pub mod dto;
pub mod endpoint;
mod middleware;
pub mod router;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub trace_level: Option<String>,
    pub trace_json: bool,
    // when set to true hides the `cause` field in the error response
    pub hide_error_response_cause: bool,
    /// How often expired sessions are purged, zero disables purging
    pub session_purge_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            trace_level: None,
            trace_json: false,
            hide_error_response_cause: false,
            session_purge_interval: Duration::from_secs(60),
        }
    }
}
