//! Serde helper for boolean columns that arrive as `0`/`1` integers.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
  Bool(bool),
  Int(i64),
  Text(String),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  match RawFlag::deserialize(deserializer)? {
    RawFlag::Bool(b) => Ok(b),
    RawFlag::Int(0) => Ok(false),
    RawFlag::Int(1) => Ok(true),
    RawFlag::Int(other) => Err(de::Error::custom(format!(
      "expected 0 or 1 for a flag, got {other}"
    ))),
    RawFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
      "0" | "false" | "no" => Ok(false),
      "1" | "true" | "yes" => Ok(true),
      other => Err(de::Error::custom(format!("not a flag value: {other:?}"))),
    },
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  #[derive(Deserialize)]
  struct Row {
    #[serde(deserialize_with = "super::deserialize")]
    flag: bool,
  }

  fn parse(json: &str) -> Result<bool, serde_json::Error> {
    serde_json::from_str::<Row>(json).map(|r| r.flag)
  }

  #[test]
  fn accepts_integers_booleans_and_text() {
    assert!(!parse(r#"{"flag":0}"#).unwrap());
    assert!(parse(r#"{"flag":1}"#).unwrap());
    assert!(parse(r#"{"flag":true}"#).unwrap());
    assert!(parse(r#"{"flag":"1"}"#).unwrap());
    assert!(!parse(r#"{"flag":"false"}"#).unwrap());
  }

  #[test]
  fn rejects_other_integers() {
    assert!(parse(r#"{"flag":2}"#).is_err());
    assert!(parse(r#"{"flag":"maybe"}"#).is_err());
  }
}
