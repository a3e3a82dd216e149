use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{FIELD_COMMENDS, FIELD_HOUSE};
use crate::error::{AppError, Result};

/// House a user is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum House {
    Gryffindor,
    Ravenclaw,
    Hufflepuff,
    Slytherin,
    /// Placeholder written at creation, before the user is sorted
    #[serde(rename = "muggle")]
    Muggle,
}

impl House {
    /// The houses a user can be sorted into
    pub const SORTED: [House; 4] = [
        House::Gryffindor,
        House::Ravenclaw,
        House::Hufflepuff,
        House::Slytherin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            House::Gryffindor => "Gryffindor",
            House::Ravenclaw => "Ravenclaw",
            House::Hufflepuff => "Hufflepuff",
            House::Slytherin => "Slytherin",
            House::Muggle => "muggle",
        }
    }

    /// Whether this is one of the four real houses
    pub fn is_sorted(&self) -> bool {
        *self != House::Muggle
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for House {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Gryffindor" => Ok(House::Gryffindor),
            "Ravenclaw" => Ok(House::Ravenclaw),
            "Hufflepuff" => Ok(House::Hufflepuff),
            "Slytherin" => Ok(House::Slytherin),
            "muggle" => Ok(House::Muggle),
            other => Err(format!("unknown house: {other}")),
        }
    }
}

/// Draw one of the four houses uniformly at random
pub fn generate_house() -> House {
    generate_house_with(&mut rand::thread_rng())
}

/// Draw a house from the given random source
pub fn generate_house_with<R: Rng + ?Sized>(rng: &mut R) -> House {
    // SORTED is a non-empty const array
    *House::SORTED.choose(rng).unwrap_or(&House::Gryffindor)
}

/// Validate a username, returning it trimmed
///
/// Empty or whitespace-only names count as "no user provided".
pub fn validate_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(AppError::NoUserProvided);
    }
    Ok(trimmed)
}

/// Typed view of a user's optional attribute fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub house: Option<House>,
    pub commends: Option<u64>,
}

impl UserRecord {
    /// Build a record from the store's string fields
    pub fn from_fields(username: &str, fields: &BTreeMap<String, String>) -> Result<Self> {
        let house = fields
            .get(FIELD_HOUSE)
            .map(|value| parse_field::<House>(FIELD_HOUSE, value))
            .transpose()?;
        let commends = fields
            .get(FIELD_COMMENDS)
            .map(|value| parse_field::<u64>(FIELD_COMMENDS, value))
            .transpose()?;

        Ok(Self {
            username: username.to_string(),
            house,
            commends,
        })
    }
}

/// Parse a stored string field, reporting the field on failure
pub fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| AppError::CorruptRecord {
        field: field.to_string(),
        value: value.to_string(),
    })
}
