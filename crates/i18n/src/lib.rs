//! Language handling for multilingual document metadata.

mod language_tag;

pub use self::language_tag::{LanguageTag, ParseLanguageTagError};
