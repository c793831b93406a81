use crate::db::StoreError;
use actix::MailboxError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Failure of a voting operation, as reported to the caller.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("User has already voted")]
    DuplicateVote,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),

    #[error("Actor mailbox error: {0}")]
    Mailbox(MailboxError),
}

impl From<MailboxError> for VoteError {
    fn from(err: MailboxError) -> Self {
        VoteError::Mailbox(err)
    }
}

impl From<StoreError> for VoteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => VoteError::DuplicateVote,
            err => VoteError::Storage(err),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub message: String,
}

impl ResponseError for VoteError {
    fn status_code(&self) -> StatusCode {
        match self {
            VoteError::Validation(_) | VoteError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            VoteError::DuplicateVote => StatusCode::CONFLICT,
            VoteError::Unauthorized => StatusCode::UNAUTHORIZED,
            VoteError::Storage(_) | VoteError::Mailbox(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            // details stay in the log
            error!(error = %self, "Request failed");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { message })
    }
}
