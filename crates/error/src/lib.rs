use actix_web::{HttpResponse, ResponseError};
use failure::Fail;
use lectern_macros::From;
use log::error;
use serde::Serialize;
use std::{borrow::Cow, fmt::Write as _};

pub use actix_web::http::StatusCode;
pub use lectern_macros::ApiError;

// Allows `#[derive(ApiError)]` inside this crate.
extern crate self as lectern_error;

/// An error that occurred while handling an API request.
pub trait ApiError: Fail {
    /// HTTP response status code.
    fn status(&self) -> StatusCode;

    /// Internal code describing this error.
    ///
    /// This code is used to identify this error outside the system, and thus
    /// should only be present for errors which are intended to be reported
    /// to the user in detail.
    fn code(&self) -> Option<Cow<str>>;
}

/// This implementation is required to make `#[cause]` on a `Box<dyn ApiError>`
/// work.
impl Fail for Box<dyn ApiError> {
    fn name(&self) -> Option<&str> {
        (**self).name()
    }

    fn cause(&self) -> Option<&dyn Fail> {
        (**self).cause()
    }

    fn backtrace(&self) -> Option<&failure::Backtrace> {
        (**self).backtrace()
    }
}

/// A wrapper around user-facing [`ApiError`]s and the few other errors that
/// can surface while handling a request.
#[derive(Debug, Fail, From)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Api(#[cause] Box<dyn ApiError>),
    /// Generic system error.
    #[fail(display = "{}", _0)]
    System(#[cause] #[from] std::io::Error),
    /// Error reading message payload.
    #[fail(display = "{}", _0)]
    Payload(#[from] actix_web::error::PayloadError),
}

impl<T: ApiError> From<T> for Error {
    fn from(error: T) -> Error {
        Error::Api(Box::new(error))
    }
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        match self {
            Error::Api(err) => {
                let status = err.status();

                // Operators need the whole chain; users only get the summary.
                if status.is_server_error() {
                    error!("{}", describe_chain(&**err));
                }

                match err.code() {
                    Some(code) => HttpResponse::build(status)
                        .json(ErrorResponse {
                            error: code,
                            raw: err.to_string(),
                        }),
                    None => HttpResponse::new(status),
                }
            }
            Error::Payload(e) => e.error_response(),
            Error::System(_) => {
                error!("{}", self);
                HttpResponse::InternalServerError()
                    .finish()
            }
        }
    }

    fn render_response(&self) -> HttpResponse {
        self.error_response()
    }
}

/// Format an error followed by all its causes.
pub fn describe_chain(err: &dyn ApiError) -> String {
    let mut message = err.to_string();
    let mut cause = err.cause();

    while let Some(err) = cause {
        let _ = write!(message, ": {}", err);
        cause = err.cause();
    }

    message
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'s> {
    error: Cow<'s, str>,
    raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Fail)]
    #[fail(display = "disk on fire")]
    struct Disk;

    #[derive(ApiError, Debug, Fail)]
    enum Sample {
        #[fail(display = "Thing not found")]
        #[api(code = "thing:not-found", status = "NOT_FOUND")]
        NotFound,
        #[fail(display = "Storage is unavailable")]
        #[api(code = "thing:unavailable", status = "SERVICE_UNAVAILABLE")]
        Unavailable(#[cause] Disk),
        #[fail(display = "Something broke")]
        #[api(internal)]
        Internal,
        #[fail(display = "{}", _0)]
        Nested(#[cause] Inner),
    }

    #[derive(ApiError, Debug, Fail)]
    #[fail(display = "Inner failure")]
    #[api(code = "thing:inner", status = "CONFLICT")]
    struct Inner;

    #[test]
    fn derived_statuses_and_codes() {
        assert_eq!(Sample::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(Sample::NotFound.code().as_deref(), Some("thing:not-found"));
        assert_eq!(Sample::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Sample::Internal.code(), None);
    }

    #[test]
    fn variants_without_api_delegate_to_cause() {
        let err = Sample::Nested(Inner);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code().as_deref(), Some("thing:inner"));
    }

    #[test]
    fn chain_includes_causes() {
        let err = Sample::Unavailable(Disk);
        assert_eq!(describe_chain(&err), "Storage is unavailable: disk on fire");
    }

    #[test]
    fn response_uses_api_status() {
        let rsp = Error::from(Sample::NotFound).error_response();
        assert_eq!(rsp.status(), StatusCode::NOT_FOUND);

        let rsp = Error::from(Sample::Unavailable(Disk)).error_response();
        assert_eq!(rsp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
