use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Accepts a plain string id or an extended-JSON ObjectId (`{"$oid": "..."}`).
fn deserialize_document_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrObjectId {
        String(String),
        ObjectId(ObjectId),
        Int(i64),
        Null,
    }

    Ok(match StringOrObjectId::deserialize(deserializer)? {
        StringOrObjectId::String(s) => s,
        StringOrObjectId::ObjectId(id) => id.oid,
        StringOrObjectId::Int(i) => i.to_string(),
        StringOrObjectId::Null => String::new(),
    })
}

fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps only string-valued categories; `null` or non-string items are dropped.
fn deserialize_outfit_items<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(category, item)| match item {
            serde_json::Value::String(name) if !name.trim().is_empty() => Some((category, name)),
            _ => None,
        })
        .collect())
}

/// An outfit document as stored in the `outfits` collection.
///
/// Documents are written by the offline generation job and their shape
/// varies, so every field is optional and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutfitRecord {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        deserialize_with = "deserialize_document_id"
    )]
    pub id: String,
    #[serde(alias = "title", default, deserialize_with = "deserialize_null_as_empty")]
    pub prompt: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_outfit_items")]
    pub outfit_items: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub weather: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub gender: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub activity: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub formality: String,
}

impl OutfitRecord {
    /// The image reference, if present and non-blank.
    pub fn usable_image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// A scored outfit returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    #[serde(rename = "_id")]
    #[schema(example = "6650f1c2a4e3b9d1c8a7e001")]
    pub id: String,
    #[schema(example = "A woman wearing a Blazer, Chinos, Loafers and a Belt")]
    pub prompt: String,
    pub image_url: String,
    #[schema(value_type = Object)]
    pub outfit_items: BTreeMap<String, String>,
    #[schema(example = "rainy")]
    pub weather: String,
    #[schema(example = "work")]
    pub activity: String,
    #[schema(example = "formal")]
    pub formality: String,
    #[schema(example = "female")]
    pub gender: String,
    /// Similarity blended with preference boosts, within [0, 1]
    #[schema(example = 0.87, minimum = 0.0, maximum = 1.0)]
    pub confidence_score: f32,
}

impl Recommendation {
    pub fn from_record(record: OutfitRecord, image_url: String, confidence_score: f32) -> Self {
        Self {
            id: record.id,
            prompt: record.prompt,
            image_url,
            outfit_items: record.outfit_items,
            weather: record.weather,
            activity: record.activity,
            formality: record.formality,
            gender: record.gender,
            confidence_score,
        }
    }
}
