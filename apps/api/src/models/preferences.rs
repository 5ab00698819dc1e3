use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    GenderNeutral,
}

impl Gender {
    /// Spellings the catalog uses for neutral outfits
    pub const NEUTRAL_SPELLINGS: [&'static str; 2] = ["gender-neutral", "gender neutral"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::GenderNeutral => "gender-neutral",
        }
    }

    /// Catalog values an outfit may carry to be shown to this gender.
    pub fn admitted_values(&self) -> Vec<&'static str> {
        match self {
            Gender::GenderNeutral => Self::NEUTRAL_SPELLINGS.to_vec(),
            other => {
                let mut values = vec![other.as_str()];
                values.extend(Self::NEUTRAL_SPELLINGS);
                values
            }
        }
    }

    /// Whether an outfit tagged `value` may be shown to this gender.
    pub fn admits(&self, value: &str) -> bool {
        let value = value.trim().to_lowercase();
        self.admitted_values().iter().any(|admitted| *admitted == value)
    }
}

impl FromStr for Gender {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "gender-neutral" | "gender neutral" | "neutral" => Ok(Gender::GenderNeutral),
            other => Err(ApiError::InvalidInput(format!(
                "Unsupported gender '{}', expected male, female or gender-neutral",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        gender.as_str().to_string()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    #[schema(value_type = String, example = "female")]
    pub gender: Gender,
}

/// Weather as either a plain tag or the conditions the mobile client reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weather {
    Tag(String),
    Conditions {
        #[serde(default)]
        temp: Option<f64>,
        #[serde(default)]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Preferences {
    #[schema(example = "Outdoor")]
    pub activity: String,
    #[schema(example = "Casual")]
    pub formality: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub weather: Option<Weather>,
    #[serde(rename = "comfortLevel", default)]
    #[schema(example = "Layered")]
    pub comfort_level: Option<String>,
}

impl Preferences {
    pub fn is_layered(&self) -> bool {
        self.comfort_level
            .as_deref()
            .is_some_and(|level| level.trim().eq_ignore_ascii_case("layered"))
    }
}
