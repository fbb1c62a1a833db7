use actix_web::{FromRequest, HttpRequest, dev::Payload};
use failure::Fail;
use futures::future::{self, FutureResult};
use lectern_error::{ApiError, Error};
use lectern_models::UserId;
use log::debug;

/// Header in which the authenticating gateway passes the acting user's ID.
pub const ACTOR_HEADER: &str = "X-Lectern-Actor";

/// Extract ID of the user on whose behalf a request is made.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor(pub UserId);

impl Actor {
    pub fn id(self) -> UserId {
        self.0
    }
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = FutureResult<Actor, Error>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let value = match req.headers().get(ACTOR_HEADER) {
            Some(value) => value,
            None => return future::err(ActorError::Missing.into()),
        };

        let actor = value.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok());

        match actor {
            Some(actor) => future::ok(Actor(actor)),
            None => {
                debug!("Malformed {} header: {:?}", ACTOR_HEADER, value);
                future::err(ActorError::Malformed.into())
            }
        }
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum ActorError {
    #[fail(display = "Request was not made on behalf of any user")]
    #[api(code = "user:not-authenticated", status = "UNAUTHORIZED")]
    Missing,
    #[fail(display = "{} must be a user ID", ACTOR_HEADER)]
    #[api(code = "user:malformed-actor", status = "BAD_REQUEST")]
    Malformed,
}
