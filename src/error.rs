use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::gpio::{Direction, NumberingMode};

/// Failure reported by a hardware backend.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GpioError(pub String);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Mode is not set.")]
    ModeNotSet,
    #[error("Unrecognized mode, {0}.")]
    InvalidMode(String),
    #[error("Unrecognized pull value: {0}")]
    InvalidPull(String),
    #[error("Unrecognized direction: {0}")]
    InvalidDirection(String),
    #[error("Direction is out but pull {0} specified.")]
    ConflictingArguments(String),
    #[error("\"{0}\" is not an integer.")]
    NotAnInteger(String),
    #[error("{} {pin} is not valid.", .mode.pin_label())]
    InvalidPin { mode: NumberingMode, pin: String },
    #[error("Unrecognized state value: {0}")]
    InvalidState(String),
    #[error("Unable to configure board pin {pin} for {direction}: {source}")]
    HardwareConfig {
        pin: u32,
        direction: Direction,
        #[source]
        source: GpioError,
    },
    #[error("Unable to GET value for pin {pin}: {source}")]
    ReadFailed {
        pin: u32,
        #[source]
        source: GpioError,
    },
    #[error("Unable to SET value for pin {pin}: {source}")]
    WriteFailed {
        pin: u32,
        #[source]
        source: GpioError,
    },
    #[error("Undefined value {raw} returned for pin {pin}.")]
    UndefinedLevel { pin: u32, raw: u8 },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ModeNotSet => StatusCode::CONFLICT,
            AppError::InvalidPin { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidMode(_)
            | AppError::InvalidPull(_)
            | AppError::InvalidDirection(_)
            | AppError::ConflictingArguments(_)
            | AppError::NotAnInteger(_)
            | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::HardwareConfig { .. }
            | AppError::ReadFailed { .. }
            | AppError::WriteFailed { .. }
            | AppError::UndefinedLevel { .. }
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
