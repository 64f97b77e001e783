//! Lenient deserializers for provider payloads.
//!
//! Market data APIs mix JSON numbers, numeric strings and `null` for the same
//! field. Anything that is not a finite number decodes as `0.0`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    let value = match raw {
        Some(RawNumber::Number(n)) => n,
        Some(RawNumber::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    };
    Ok(finite_or_zero(value))
}

pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Number(n)) if n.is_finite() => Some(n),
        Some(RawNumber::Text(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: f64,
        #[serde(default, deserialize_with = "lenient_opt_f64")]
        maybe: Option<f64>,
    }

    #[test]
    fn test_numbers_strings_and_nulls() {
        let s: Sample = serde_json::from_str(r#"{"value": "12.5", "maybe": 3}"#).unwrap();
        assert_eq!(s.value, 12.5);
        assert_eq!(s.maybe, Some(3.0));

        let s: Sample = serde_json::from_str(r#"{"value": null, "maybe": "n/a"}"#).unwrap();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.maybe, None);

        let s: Sample = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.maybe, None);
    }
}
