use failure::Fail;
use lectern_macros::From;
use uuid::Uuid;

use crate::{db::types::Role, document::UserId};

/// Lookup of lessons documents can be attached to.
pub trait LessonDirectory: Send + Sync {
    fn lesson_exists(&self, lesson: Uuid) -> Result<bool, DirectoryError>;
}

/// Lookup of users' roles.
pub trait IdentityDirectory: Send + Sync {
    /// Role of a user, or `None` if there is no such user.
    fn role(&self, user: UserId) -> Result<Option<Role>, DirectoryError>;
}

#[derive(Debug, Fail, From)]
pub enum DirectoryError {
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] #[from] diesel::result::Error),
    #[fail(display = "Cannot obtain database connection: {}", _0)]
    Pool(#[cause] #[from] r2d2::Error),
    #[fail(display = "Directory unavailable: {}", _0)]
    Unavailable(String),
}
