use failure::Fail;
use lectern_i18n::LanguageTag;
use lectern_util::char_len;
use serde::Deserialize;

use crate::document::{Translation, Translations};
use super::Policy;

/// Longest allowed title, in characters.
pub const TITLE_MAX: usize = 100;

/// Shortest allowed description, in characters.
pub const DESCRIPTION_MIN: usize = 5;

/// Longest allowed description, in characters.
pub const DESCRIPTION_MAX: usize = 500;

/// Title and description of a document in one locale, as submitted.
#[derive(Clone, Debug, Deserialize)]
pub struct TranslationInput {
    pub locale: String,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Eq, Fail, PartialEq)]
pub enum TranslationError {
    #[fail(display = "Translation into {} is missing", _0)]
    Missing(LanguageTag),
    #[fail(display = "{:?} is not one of the configured locales", _0)]
    UnknownLocale(String),
    #[fail(display = "Translation into {} was given more than once", _0)]
    Duplicate(LanguageTag),
    #[fail(display = "Title in {} must be between 1 and {} characters long",
        _0, TITLE_MAX)]
    TitleInvalid(LanguageTag),
    #[fail(display = "Description in {} must be between {} and {} characters long",
        _0, DESCRIPTION_MIN, DESCRIPTION_MAX)]
    DescriptionInvalid(LanguageTag),
}

/// Validate translations of a document, producing the trimmed texts to store.
///
/// Every configured locale must be translated exactly once, and nothing else
/// may be. Missing locales are reported in the order they are configured in.
pub fn validate_translations(policy: &Policy, inputs: &[TranslationInput])
-> Result<Translations, TranslationError> {
    let mut translations = Translations::default();

    for input in inputs {
        let locale = input.locale.parse::<LanguageTag>()
            .ok()
            .filter(|locale| policy.locales().contains(locale))
            .ok_or_else(|| TranslationError::UnknownLocale(input.locale.clone()))?;

        let title = input.title.trim();
        let description = input.description.trim();

        if title.is_empty() || char_len(title) > TITLE_MAX {
            return Err(TranslationError::TitleInvalid(locale));
        }

        let length = char_len(description);
        if length < DESCRIPTION_MIN || length > DESCRIPTION_MAX {
            return Err(TranslationError::DescriptionInvalid(locale));
        }

        let translation = Translation {
            title: title.to_string(),
            description: description.to_string(),
        };

        if !translations.insert(locale.clone(), translation) {
            return Err(TranslationError::Duplicate(locale));
        }
    }

    if let Some(missing) = policy.locales().iter().find(|l| translations.get(l).is_none()) {
        return Err(TranslationError::Missing(missing.clone()));
    }

    Ok(translations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Policy {
        Policy::new(["en", "pl", "es"].iter().map(|l| l.parse().unwrap()))
    }

    fn tag(v: &str) -> LanguageTag {
        v.parse().unwrap()
    }

    fn input(locale: &str, title: &str, description: &str) -> TranslationInput {
        TranslationInput {
            locale: locale.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    fn complete() -> Vec<TranslationInput> {
        vec![
            input("pl", "Ułamki", "Wprowadzenie do ułamków"),
            input("en", "Fractions", "Introduction to fractions"),
            input("es", "Fracciones", "Introducción a las fracciones"),
        ]
    }

    #[test]
    fn accepts_complete_translations() {
        let translations = validate_translations(&policy(), &complete()).unwrap();

        let locales = translations.locales().map(LanguageTag::as_str).collect::<Vec<_>>();
        assert_eq!(locales, ["en", "es", "pl"]);
        assert_eq!(translations.get(&tag("pl")).unwrap().title, "Ułamki");
    }

    #[test]
    fn texts_are_trimmed() {
        let mut inputs = complete();
        inputs[1] = input("en", "  Fractions \n", "\tIntroduction  ");

        let translations = validate_translations(&policy(), &inputs).unwrap();
        let en = translations.get(&tag("en")).unwrap();
        assert_eq!(en.title, "Fractions");
        assert_eq!(en.description, "Introduction");
    }

    #[test]
    fn missing_locale_is_reported_in_configured_order() {
        let inputs = vec![input("es", "Fracciones", "Introducción")];

        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::Missing(tag("en"))),
        );
    }

    #[test]
    fn unknown_and_duplicate_locales_are_rejected() {
        let mut inputs = complete();
        inputs.push(input("de", "Brüche", "Einführung in Brüche"));
        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::UnknownLocale("de".to_string())),
        );

        let mut inputs = complete();
        inputs.push(input("EN", "Fractions", "Introduction to fractions"));
        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::Duplicate(tag("en"))),
        );

        let inputs = vec![input("not a locale", "Title", "Description")];
        assert!(matches!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::UnknownLocale(_)),
        ));
    }

    #[test]
    fn title_limits() {
        let mut inputs = complete();
        inputs[0] = input("pl", "   ", "Wprowadzenie do ułamków");
        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::TitleInvalid(tag("pl"))),
        );

        // Characters are counted, not bytes.
        inputs[0] = input("pl", &"ł".repeat(TITLE_MAX), "Wprowadzenie do ułamków");
        assert!(validate_translations(&policy(), &inputs).is_ok());

        inputs[0] = input("pl", &"ł".repeat(TITLE_MAX + 1), "Wprowadzenie do ułamków");
        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::TitleInvalid(tag("pl"))),
        );
    }

    #[test]
    fn description_limits() {
        let mut inputs = complete();
        inputs[2] = input("es", "Fracciones", " abcd ");
        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::DescriptionInvalid(tag("es"))),
        );

        inputs[2] = input("es", "Fracciones", "abcde");
        assert!(validate_translations(&policy(), &inputs).is_ok());

        inputs[2] = input("es", "Fracciones", &"ñ".repeat(DESCRIPTION_MAX));
        assert!(validate_translations(&policy(), &inputs).is_ok());

        inputs[2] = input("es", "Fracciones", &"ñ".repeat(DESCRIPTION_MAX + 1));
        assert_eq!(
            validate_translations(&policy(), &inputs),
            Err(TranslationError::DescriptionInvalid(tag("es"))),
        );
    }
}
