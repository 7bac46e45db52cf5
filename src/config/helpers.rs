use std::{fmt::Display, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serializer};

/// Custom deserializer for Duration from milliseconds
pub fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Custom deserializer for Duration from seconds
pub fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// Custom serializer for Duration to seconds
pub fn serialize_duration_to_seconds<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Any scalar the config sources can hand us. Environment overrides always
/// arrive as strings, YAML values keep their native type.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s.trim()),
        }
    }
}

/// Deserializes any scalar through `FromStr`, yielding `None` (and a warning)
/// instead of an error when the value cannot be parsed. Callers substitute
/// their documented default for `None`.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = Option::<Scalar>::deserialize(deserializer).unwrap_or(None) else {
        return Ok(None);
    };
    let text = raw.to_string();
    match text.parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(value = %text, error = %e, "Ignoring unparseable configuration value, using default.");
            Ok(None)
        }
    }
}

/// Deserializes a strictly positive, finite number of seconds (fractions
/// allowed) into a `Duration`. Anything else resolves to `None`.
pub fn deserialize_lenient_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(secs) = deserialize_lenient::<D, f64>(deserializer)? else {
        return Ok(None);
    };
    if !secs.is_finite() || secs <= 0.0 {
        tracing::warn!(value = secs, "Ignoring non-positive duration, using default.");
        return Ok(None);
    }
    Ok(Duration::try_from_secs_f64(secs).ok())
}

/// Deserializes a keyword list given either as a sequence or as a single
/// comma-separated string (the form environment overrides take). Blank
/// entries are dropped.
pub fn deserialize_keyword_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KeywordList {
        List(Vec<String>),
        Csv(String),
    }

    let items = match Option::<KeywordList>::deserialize(deserializer).unwrap_or(None) {
        Some(KeywordList::List(items)) => items,
        Some(KeywordList::Csv(csv)) => csv.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    Ok(items.into_iter().map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect())
}
