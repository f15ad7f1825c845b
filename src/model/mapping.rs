use serde::de::Error as SerdeError;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The ordered list of headers from the log sheet's first row, with an index
/// lookup keyed by the normalized (trimmed, lower-cased) header text.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<Header>,
    header_map: HashMap<String, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from a list of header strings. Two headers that
    /// normalize to the same text are considered duplicates.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<Header> = headers.into_iter().map(|s| s.into().into()).collect();

        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.normalized(), idx))
            .collect();

        if header_map.len() != headers.len() {
            return Err(MappingError(String::from("Encountered a duplicate header")));
        }

        Ok(Self {
            headers,
            header_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The position of `header` in the sheet, matched case-insensitively.
    pub fn header_index(&self, header: impl AsRef<str>) -> Option<usize> {
        let h = Header::from(header.as_ref()).normalized();
        self.header_map.get(&h).copied()
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.headers.len()))?;
        for header in &self.headers {
            seq.serialize_element(header.as_ref())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items: Vec<String> = Vec::deserialize(deserializer)?;
        let mapping = Mapping::new(items).map_err(D::Error::custom)?;
        Ok(mapping)
    }
}

/// Represents a header in the log sheet, for example, `Weight (kg)`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(String);

impl Header {
    /// The header text trimmed and lower-cased, the form used for lookups.
    pub fn normalized(&self) -> String {
        self.0.trim().to_lowercase()
    }
}

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for Header {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl FromStr for Header {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}
