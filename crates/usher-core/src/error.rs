use thiserror::Error;

/// Service error types.
///
/// Each variant maps to an HTTP status code via [`Error::status_code`] and a
/// stable machine-readable code via [`Error::code`]. Responses serialize as
/// `{ "code": "...", "message": "..." }`; 500-class errors use a generic
/// message so internals never leak to clients.
#[derive(Error, Debug)]
pub enum Error {
    // --- 400 Bad Request ---
    #[error("{0}")]
    InvalidRequest(String),

    // --- 401 Unauthorized ---
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Session not found or expired")]
    SessionNotFound,

    // --- 403 Forbidden ---
    #[error("{0}")]
    Forbidden(String),

    #[error(
        "This invitation was sent to a different email address. \
         Sign out and sign up with the invited address to accept it."
    )]
    EmailMismatch,

    // --- 404 Not Found ---
    #[error("{0}")]
    NotFound(String),

    // --- 409 Conflict ---
    #[error("{0}")]
    Conflict(String),

    #[error("This invitation has already been processed")]
    InvitationProcessed,

    // --- 410 Gone ---
    #[error("This invitation has expired. Ask an organization owner to send a new one.")]
    InvitationExpired,

    // --- 422 Unprocessable Entity ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- 500 Internal Server Error ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Email delivery error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Unauthenticated | Self::SessionNotFound => 401,
            Self::Forbidden(_) | Self::EmailMismatch => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::InvitationProcessed => 409,
            Self::InvitationExpired => 410,
            Self::Validation(_) => 422,
            Self::Config(_)
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Email(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code, used by clients to branch on
    /// invitation-specific failures without parsing messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Unauthenticated | Self::SessionNotFound => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::EmailMismatch => "EMAIL_MISMATCH",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvitationProcessed => "INVITATION_PROCESSED",
            Self::InvitationExpired => "INVITATION_EXPIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_)
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Email(_)
            | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Internal errors collapse to a generic message;
    /// the detail is logged server-side instead.
    pub fn client_message(&self) -> String {
        match self.status_code() {
            500 => "Internal server error. Please try again.".to_string(),
            _ => self.to_string(),
        }
    }

    // --- Constructors ---

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DatabaseError {
    /// Whether this error is a uniqueness-constraint violation.
    ///
    /// Handlers treat this as the authoritative "row already exists" signal
    /// for check-then-act insert paths, converting it into the idempotent
    /// outcome instead of a hard error.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DatabaseError::Constraint(db_err.to_string())
                } else {
                    DatabaseError::Query(db_err.to_string())
                }
            }
            sqlx::Error::PoolClosed => DatabaseError::Connection("Pool closed".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::Connection("Pool timed out".to_string()),
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(DatabaseError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "code": self.code(),
            "message": self.client_message(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(Error::Unauthenticated.status_code(), 401);
        assert_eq!(Error::forbidden("nope").status_code(), 403);
        assert_eq!(Error::invalid_request("bad").status_code(), 400);
        assert_eq!(Error::not_found("missing").status_code(), 404);
        assert_eq!(Error::InvitationExpired.status_code(), 410);
        assert_eq!(Error::InvitationProcessed.status_code(), 409);
        assert_eq!(Error::EmailMismatch.status_code(), 403);
        assert_eq!(Error::internal("boom").status_code(), 500);
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = Error::internal("connection string with password");
        assert_eq!(err.client_message(), "Internal server error. Please try again.");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn invitation_errors_have_distinct_codes() {
        assert_eq!(Error::InvitationExpired.code(), "INVITATION_EXPIRED");
        assert_eq!(Error::InvitationProcessed.code(), "INVITATION_PROCESSED");
        assert_eq!(Error::EmailMismatch.code(), "EMAIL_MISMATCH");
    }
}
