use serde::{Deserialize, Deserializer, Serialize};

// summary columns arrive as json numbers (ints or float means), categorical
// labels are usually strings but may be numeric codes
fn deserialize_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    if let serde_json::Value::String(s) = value {
        Ok(s)
    } else if let serde_json::Value::Number(s) = value {
        Ok(s.to_string())
    } else {
        Err(serde::de::Error::custom("Expected string|number"))
    }
}

/// One rendered summary row: a group label plus its three rider figures.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data {
    #[serde(deserialize_with = "deserialize_string")]
    pub label: String,
    #[serde(deserialize_with = "deserialize_string")]
    pub casual: String,
    #[serde(deserialize_with = "deserialize_string")]
    pub registered: String,
    #[serde(deserialize_with = "deserialize_string")]
    pub count: String,
}

impl Data {
    pub const fn ref_array(&self) -> [&String; 4] {
        [&self.label, &self.casual, &self.registered, &self.count]
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn casual(&self) -> &str {
        &self.casual
    }

    pub fn registered(&self) -> &str {
        &self.registered
    }

    pub fn count(&self) -> &str {
        &self.count
    }
}
