use thiserror::Error;

/// Vendor error code returned when the motor hits its mechanical limit.
pub const ERROR_END_OF_TRAVEL: i64 = -64304;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("cloud credentials are not configured")]
    MissingCredentials,
    #[error("HTTP transport error: {0}")]
    Transport(String),
    #[error("cloud API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected payload from cloud API: {0}")]
    UnexpectedPayload(String),
    #[error("device rejected the request with error code {0}")]
    DeviceRejected(i64),
    #[error("camera cannot move further in this direction")]
    EndOfTravel,
}

impl ApiError {
    pub fn unexpected(context: &str) -> Self {
        ApiError::UnexpectedPayload(context.to_string())
    }

    /// Map a passthrough `error_code` to a result, folding the vendor's
    /// end-of-travel code into its own variant.
    pub fn from_error_code(code: i64) -> Result<(), Self> {
        match code {
            0 => Ok(()),
            ERROR_END_OF_TRAVEL => Err(ApiError::EndOfTravel),
            other => Err(ApiError::DeviceRejected(other)),
        }
    }
}
