use serde::{Deserialize, Deserializer};

/// Accepts a row id encoded either as a JSON string or a JSON number.
///
/// The relational store assigns ids; depending on the column type they arrive as
/// `bigint` or `uuid`, and callers only ever treat them as opaque strings.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}
