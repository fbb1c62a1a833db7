//! Pure checks applied to a document before any side effect of ingestion.

use lectern_i18n::LanguageTag;

mod file;
mod translation;

pub use self::{
    file::{FileError, Upload, ValidatedFile, validate_file},
    translation::{
        DESCRIPTION_MAX,
        DESCRIPTION_MIN,
        TITLE_MAX,
        TranslationError,
        TranslationInput,
        validate_translations,
    },
};

/// Largest file accepted for a document, in bytes.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Limits that documents are validated against.
#[derive(Clone, Debug)]
pub struct Policy {
    locales: Vec<LanguageTag>,
    max_file_size: u64,
}

impl Policy {
    /// Create a policy requiring a translation for each of `locales`.
    ///
    /// Repeated locales are ignored; the first occurrence determines the
    /// position of a locale in [`Policy::locales`].
    pub fn new<I>(locales: I) -> Policy
    where
        I: IntoIterator<Item = LanguageTag>,
    {
        let mut unique = Vec::new();

        for locale in locales {
            if !unique.contains(&locale) {
                unique.push(locale);
            }
        }

        Policy {
            locales: unique,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Lower the file size limit. Limits above [`MAX_FILE_SIZE`] are clamped.
    pub fn with_max_file_size(mut self, limit: u64) -> Policy {
        self.max_file_size = limit.min(MAX_FILE_SIZE);
        self
    }

    /// Locales every document must be translated into, in configured order.
    pub fn locales(&self) -> &[LanguageTag] {
        &self.locales
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_deduplicates_locales() {
        let policy = Policy::new(
            ["en", "pl", "EN"].iter().map(|l| l.parse().unwrap()));

        let locales = policy.locales().iter()
            .map(LanguageTag::as_str)
            .collect::<Vec<_>>();

        assert_eq!(locales, ["en", "pl"]);
    }

    #[test]
    fn file_size_limit_is_clamped() {
        let policy = Policy::new(None).with_max_file_size(u64::max_value());
        assert_eq!(policy.max_file_size(), MAX_FILE_SIZE);

        let policy = Policy::new(None).with_max_file_size(1024);
        assert_eq!(policy.max_file_size(), 1024);
    }
}
