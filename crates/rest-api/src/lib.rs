//! Lectern's REST API.

use actix_web::web::{self, ServiceConfig};

mod config;
mod documents;

pub use self::config::Config;

pub type Result<T, E=lectern_error::Error> = std::result::Result<T, E>;

/// Configure [`App`] for an API server.
///
/// The application must hold [`lectern_models::Services`] as its data.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(documents::configure)
    );
}
