use serde::de::{self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde_json::{Map, Number as JsonNumber, Value as JsonValue};
use serde_yaml::{Mapping, Number as YamlNumber, Value as YamlValue};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("Mapping key {0} cannot be used as a JSON object key")]
    UnsupportedKey(String),
    #[error("Float {0} cannot be represented in JSON")]
    NonFiniteFloat(f64),
}

/// Decodes the first YAML document in `input` and encodes it as compact JSON.
///
/// An input with no documents at all becomes `null`.
pub fn yaml_to_json(input: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    let mut value = match serde_yaml::Deserializer::from_slice(input).next() {
        Some(document) => YamlDocument.deserialize(document)?,
        None => YamlValue::Null,
    };
    value.apply_merge()?;
    let json = to_json_value(value)?;
    Ok(serde_json::to_vec(&json)?)
}

/// Builds a `serde_yaml::Value` like its own `Deserialize` impl does, but
/// widens integers outside the 64-bit range to floats instead of failing,
/// and drops custom tags.
#[derive(Clone, Copy)]
struct YamlDocument;

impl<'de> DeserializeSeed<'de> for YamlDocument {
    type Value = YamlValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<YamlValue, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for YamlDocument {
    type Value = YamlValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<YamlValue, E> {
        Ok(YamlValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<YamlValue, E> {
        Ok(YamlValue::Number(i.into()))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<YamlValue, E> {
        Ok(YamlValue::Number(u.into()))
    }

    fn visit_i128<E: de::Error>(self, i: i128) -> Result<YamlValue, E> {
        match i64::try_from(i) {
            Ok(i) => self.visit_i64(i),
            Err(_) => self.visit_f64(i as f64),
        }
    }

    fn visit_u128<E: de::Error>(self, u: u128) -> Result<YamlValue, E> {
        match u64::try_from(u) {
            Ok(u) => self.visit_u64(u),
            Err(_) => self.visit_f64(u as f64),
        }
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<YamlValue, E> {
        Ok(YamlValue::Number(f.into()))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<YamlValue, E> {
        Ok(YamlValue::String(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<YamlValue, E> {
        Ok(YamlValue::String(s))
    }

    fn visit_unit<E: de::Error>(self) -> Result<YamlValue, E> {
        Ok(YamlValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<YamlValue, E> {
        Ok(YamlValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<YamlValue, D::Error> {
        self.deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<YamlValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(self)? {
            items.push(item);
        }
        Ok(YamlValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<YamlValue, A::Error> {
        let mut mapping = Mapping::new();
        while let Some(key) = map.next_key_seed(self)? {
            let value = map.next_value_seed(self)?;
            mapping.insert(key, value);
        }
        Ok(YamlValue::Mapping(mapping))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<YamlValue, A::Error> {
        let (_tag, contents): (String, _) = data.variant()?;
        contents.newtype_variant_seed(self)
    }
}

/// Re-indents JSON with two spaces per level, without changing key order or
/// the text of any scalar.
pub fn prettify_json(json: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(json.len() * 2);
    let mut deserializer = serde_json::Deserializer::from_slice(json);
    {
        let mut serializer = serde_json::Serializer::pretty(&mut out);
        serde_transcode::transcode(&mut deserializer, &mut serializer)?;
    }
    deserializer.end()?;
    Ok(out)
}

fn to_json_value(value: YamlValue) -> Result<JsonValue, TranscodeError> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => JsonValue::Number(to_json_number(&n)?),
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(seq) => JsonValue::Array(
            seq.into_iter()
                .map(to_json_value)
                .collect::<Result<_, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(to_json_key(key)?, to_json_value(value)?);
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => to_json_value(tagged.value)?,
    })
}

fn to_json_number(n: &YamlNumber) -> Result<JsonNumber, TranscodeError> {
    if let Some(u) = n.as_u64() {
        Ok(u.into())
    } else if let Some(i) = n.as_i64() {
        Ok(i.into())
    } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        JsonNumber::from_f64(f).ok_or(TranscodeError::NonFiniteFloat(f))
    }
}

fn to_json_key(key: YamlValue) -> Result<String, TranscodeError> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => match n.as_f64() {
            Some(f) if f.is_nan() => Ok("NaN".to_string()),
            Some(f) if f.is_infinite() => Ok(if f > 0.0 { "+Inf" } else { "-Inf" }.to_string()),
            _ => Ok(to_json_number(&n)?.to_string()),
        },
        YamlValue::Tagged(tagged) => to_json_key(tagged.value),
        other @ (YamlValue::Sequence(_) | YamlValue::Mapping(_)) => {
            let shown = serde_json::to_string(&other).unwrap_or_else(|_| format!("{:?}", other));
            Err(TranscodeError::UnsupportedKey(shown))
        }
    }
}
