mod extractors;
mod responders;

pub use self::{
    extractors::{ACTOR_HEADER, Actor, ActorError},
    responders::Created,
};
