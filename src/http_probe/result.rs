/// Outcome of a single GET against the target.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// `None` when no response was received (refused, DNS, timeout).
    pub http_status: Option<u16>,
    pub body_preview: String,
    pub passed: bool,
    pub http_time: f64,
    /// Error report when the request or the body read failed.
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn from_response(status: u16, body_preview: String, expected_status: u16, http_time: f64) -> Self {
        Self {
            http_status: Some(status),
            body_preview,
            passed: status == expected_status,
            http_time,
            error: None,
        }
    }

    /// A transport level failure never passes the check.
    pub fn from_error(status: Option<u16>, error: String, http_time: f64) -> Self {
        Self {
            http_status: status,
            body_preview: String::new(),
            passed: false,
            http_time,
            error: Some(error),
        }
    }
}
