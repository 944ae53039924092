//! X.500-style party names and their wire projections.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A distinguished name identifying a network participant.
///
/// `O`, `L` and `C` are required; `ST`, `OU` and `CN` are optional.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PartyName {
    pub common_name: Option<String>,
    pub organizational_unit: Option<String>,
    pub organization: String,
    pub locality: String,
    pub state: Option<String>,
    pub country: String,
}

impl PartyName {
    /// Create a name from the required attributes.
    pub fn new(
        organization: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> crate::Result<Self> {
        let name = Self {
            common_name: None,
            organizational_unit: None,
            organization: organization.into(),
            locality: locality.into(),
            state: None,
            country: country.into(),
        };
        name.validate()?;
        Ok(name)
    }

    /// Parse `CN=…, OU=…, O=…, L=…, ST=…, C=…` in any attribute order.
    ///
    /// `\,`, `\=` and `\\` inside a value stand for the literal character.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let mut common_name = None;
        let mut organizational_unit = None;
        let mut organization = None;
        let mut locality = None;
        let mut state = None;
        let mut country = None;

        for part in split_unescaped(text, ',') {
            let (key, value) = split_once_unescaped(part, '=')
                .ok_or_else(|| invalid(format!("missing '=' in {:?}", part.trim())))?;
            let value = unescape(value.trim());
            if value.is_empty() {
                return Err(invalid(format!("empty value for {}", key.trim())));
            }
            let slot = match key.trim().to_ascii_uppercase().as_str() {
                "CN" => &mut common_name,
                "OU" => &mut organizational_unit,
                "O" => &mut organization,
                "L" => &mut locality,
                "ST" => &mut state,
                "C" => &mut country,
                other => return Err(invalid(format!("unknown attribute {other}"))),
            };
            if slot.replace(value).is_some() {
                return Err(invalid(format!("duplicate attribute {}", key.trim())));
            }
        }

        let name = Self {
            common_name,
            organizational_unit,
            organization: organization.ok_or_else(|| invalid("missing O".into()))?,
            locality: locality.ok_or_else(|| invalid("missing L".into()))?,
            state,
            country: country.ok_or_else(|| invalid("missing C".into()))?,
        };
        name.validate()?;
        Ok(name)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.organization.trim().is_empty() || self.locality.trim().is_empty() {
            return Err(invalid("organization and locality are required".into()));
        }
        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid(format!(
                "country must be two upper-case letters, got {:?}",
                self.country
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> crate::Error {
    crate::Error::InvalidPartyName(message)
}

/// Split at every `sep` not preceded by a backslash escape.
fn split_unescaped(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == sep => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn split_once_unescaped(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut parts = split_unescaped(text, sep).into_iter();
    let key = parts.next()?;
    parts.next()?;
    Some((key, &text[key.len() + sep.len_utf8()..]))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next().unwrap_or('\\')),
            c => out.push(c),
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = [
            ("CN", self.common_name.as_deref()),
            ("OU", self.organizational_unit.as_deref()),
            ("O", Some(self.organization.as_str())),
            ("L", Some(self.locality.as_str())),
            ("ST", self.state.as_deref()),
            ("C", Some(self.country.as_str())),
        ];
        let mut first = true;
        for (key, value) in attributes {
            let Some(value) = value else { continue };
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{key}={}", escape(value))?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PartyName {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PartyName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartyName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Flattened JSON projection of a [`PartyName`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyNameModel {
    pub organization: String,
    pub locality: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
}

impl From<&PartyName> for PartyNameModel {
    fn from(name: &PartyName) -> Self {
        Self {
            organization: name.organization.clone(),
            locality: name.locality.clone(),
            country: name.country.clone(),
            state: name.state.clone(),
            organizational_unit: name.organizational_unit.clone(),
            common_name: name.common_name.clone(),
        }
    }
}

impl From<&Party> for PartyNameModel {
    fn from(party: &Party) -> Self {
        Self::from(&party.name)
    }
}

/// A party as reported by a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: PartyName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_key: Option<String>,
}

impl Party {
    pub fn new(name: PartyName) -> Self {
        Self {
            name,
            owning_key: None,
        }
    }
}
