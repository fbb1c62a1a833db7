use failure::Fail;
use serde::{de::{Deserialize, Deserializer, Error}, ser::{Serialize, Serializer}};
use std::{cmp::Ordering, fmt, hash::{Hash, Hasher}, str::FromStr};
use unic_langid::LanguageIdentifier;

/// A BCP 47 language tag, kept in its canonical form.
///
/// Two tags differing only in case (`en-us` and `EN-US`) are equal, and
/// display as the canonical `en-US`. Tags order by their canonical string,
/// which is the order translations are stored and listed in.
#[derive(Clone, Debug)]
pub struct LanguageTag(String, LanguageIdentifier);

impl LanguageTag {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_unic(&self) -> &LanguageIdentifier {
        &self.1
    }
}

impl PartialEq for LanguageTag {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for LanguageTag {}

impl PartialOrd for LanguageTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LanguageTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Hash for LanguageTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LanguageTag {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        String::deserialize(de)?
            .parse()
            .map_err(D::Error::custom)
    }
}

impl Serialize for LanguageTag {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&self.0)
    }
}

impl FromStr for LanguageTag {
    type Err = ParseLanguageTagError;

    fn from_str(v: &str) -> Result<LanguageTag, Self::Err> {
        let v = v.trim();

        if v.is_empty() {
            return Err(ParseLanguageTagError(v.to_string()));
        }

        let id = v.parse::<LanguageIdentifier>()
            .map_err(|_| ParseLanguageTagError(v.to_string()))?;

        Ok(LanguageTag(id.to_string(), id))
    }
}

#[derive(Clone, Debug, Eq, Fail, PartialEq)]
#[fail(display = "{:?} is not a valid language tag", _0)]
pub struct ParseLanguageTagError(pub String);
