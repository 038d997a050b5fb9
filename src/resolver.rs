//! Maps a caller-supplied token to a stored person.
//!
//! A token made only of ASCII digits is always an id, so a person whose name
//! is purely numeric can be reached by id only. Anything else is normalized
//! and matched against stored names exactly, unless normalizing leaves only
//! digits (`" 12"`), which matches nothing.

use std::fmt;

use tracing::debug;

use crate::{error::AppResult, models::Person, normalize::normalize_name, store::PersonTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonRef {
    Id(i64),
    Name(String),
    /// Digits too large for an id, or a name that normalizes to nothing or
    /// to digits only.
    Unmatchable,
}

impl PersonRef {
    pub fn parse(token: &str) -> Self {
        if is_digits(token) {
            return token.parse::<i64>().map_or(Self::Unmatchable, Self::Id);
        }

        let name = normalize_name(token);
        if name.is_empty() || is_digits(&name) {
            Self::Unmatchable
        } else {
            Self::Name(name)
        }
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for PersonRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonRef::Id(id) => write!(f, "id {id}"),
            PersonRef::Name(name) => write!(f, "name {name:?}"),
            PersonRef::Unmatchable => f.write_str("unmatchable token"),
        }
    }
}

/// Looks the token up inside `tx`. `Ok(None)` means no record matches.
pub async fn resolve(tx: &mut dyn PersonTransaction, token: &str) -> AppResult<Option<Person>> {
    let reference = PersonRef::parse(token);
    let found = match &reference {
        PersonRef::Id(id) => tx.find_by_id(*id).await?,
        PersonRef::Name(name) => tx.find_by_name(name).await?,
        PersonRef::Unmatchable => None,
    };

    debug!(%reference, found = found.is_some(), "resolved person token");
    Ok(found)
}
