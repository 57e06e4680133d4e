//! Unified error handling for analyticsd.
//!
//! This module provides the error hierarchy for the ingest API, with
//! HTTP response generation and metric labeling.

use crate::state::CounterPath;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Rejection reasons (command usage validation)
// ============================================================================

/// Why a command usage report was refused.
///
/// The `Display` text is returned verbatim to the reporting client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("No command name provided.")]
    MissingCommand,

    #[error("{0} is not a valid command.")]
    UnknownCommand(String),

    #[error("{0} requires a subcommand.")]
    MissingSubcommand(String),

    #[error("{0} does not have subcommand groups. Does it have direct subcommands?")]
    CommandHasNoGroups(String),

    #[error("{1} is not a valid subcommand group for {0}.")]
    UnknownGroup(String, String),

    #[error("{2} is not a valid subcommand for {0}.{1}.")]
    UnknownSubcommandInGroup(String, String, String),

    #[error("{0} does not have direct subcommands. Does it have subcommand groups?")]
    CommandHasNoDirectSubcommands(String),

    #[error("{1} is not a valid subcommand for {0}.")]
    UnknownSubcommand(String, String),

    #[error("Failed to update the data for {0}. Double check that it is valid?")]
    DispatchFailed(CounterPath),
}

impl RejectionReason {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCommand => "missing_command",
            Self::UnknownCommand(_) => "unknown_command",
            Self::MissingSubcommand(_) => "missing_subcommand",
            Self::CommandHasNoGroups(_) => "command_has_no_groups",
            Self::UnknownGroup(..) => "unknown_group",
            Self::UnknownSubcommandInGroup(..) => "unknown_subcommand_in_group",
            Self::CommandHasNoDirectSubcommands(_) => "command_has_no_direct_subcommands",
            Self::UnknownSubcommand(..) => "unknown_subcommand",
            Self::DispatchFailed(_) => "dispatch_failed",
        }
    }
}

// ============================================================================
// API errors (request boundary)
// ============================================================================

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized.")]
    Unauthorized,

    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    /// A required field was absent; carries the client-facing message.
    #[error("{0}")]
    MissingField(&'static str),

    #[error("{0} is not a valid event type.")]
    UnknownEvent(String),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),
}

impl ApiError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Rejected(reason) => reason.error_code(),
            Self::MissingField(_) => "missing_field",
            Self::UnknownEvent(_) => "unknown_event",
            Self::MalformedBody(_) => "malformed_body",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Rejected(_)
            | Self::MissingField(_)
            | Self::UnknownEvent(_)
            | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// JSON body shared by every response: `{ "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageBody::new(self.to_string()))).into_response()
    }
}

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
