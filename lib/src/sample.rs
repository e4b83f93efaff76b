use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Time is an instant in milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i64);

impl Time {
    pub const fn from_unix_millis(ms: i64) -> Self {
        Time(ms)
    }

    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Rounds to the nearest millisecond.
    pub fn from_secs_f64(secs: f64) -> Self {
        Time((secs * 1000.0).round() as i64)
    }
}

impl From<SystemTime> for Time {
    fn from(t: SystemTime) -> Self {
        // Instants before the epoch saturate to zero.
        let ms = t
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
            .unwrap_or_default();
        Time(ms)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_secs_f64())
    }
}

// Sample is a single observation of a time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Time,
    pub value: f64,
}

impl Sample {
    pub const fn new(timestamp_ms: i64, value: f64) -> Self {
        Sample {
            timestamp: Time::from_unix_millis(timestamp_ms),
            value,
        }
    }
}

/// Reports whether timestamps never decrease, which downsampling assumes.
pub fn is_sorted(series: &[Sample]) -> bool {
    series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

/// A point on the plane that the triangle-area selection can reason about.
pub trait Point {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
}

impl Point for Sample {
    fn x(&self) -> f64 {
        self.timestamp.unix_millis() as f64
    }

    fn y(&self) -> f64 {
        self.value
    }
}

impl Point for (f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }

    fn y(&self) -> f64 {
        self.1
    }
}

/// Formats a value the way the query API spells it on the wire.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

pub fn parse_value(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => s.parse().ok(),
    }
}

// Samples travel as `[<unix seconds>, "<value>"]`.
impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.timestamp.as_secs_f64())?;
        tup.serialize_element(&format_value(self.value))?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_tuple(2, SampleVisitor)
    }
}

struct SampleVisitor;

impl<'de> Visitor<'de> for SampleVisitor {
    type Value = Sample;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a [timestamp, value] pair")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Sample, A::Error> {
        let secs: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let value: Value = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }
        Ok(Sample {
            timestamp: Time::from_secs_f64(secs),
            value: value.0,
        })
    }
}

// Value accepts both the quoted and the bare numeric spelling.
struct Value(f64);

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sample value as a string or number")
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        parse_value(s)
            .map(Value)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(s), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value(v as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_serializes_as_pair() {
        let s = Sample::new(1435781451781, 1.0);
        assert_eq!(
            serde_json::to_string(&s).unwrap(),
            r#"[1435781451.781,"1"]"#
        );
    }

    #[test]
    fn special_values_are_spelled_out() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(0.25), "0.25");
    }

    #[test]
    fn sample_parses_quoted_and_bare_values() {
        let s: Sample = serde_json::from_str(r#"[1435781451.781, "2.5"]"#).unwrap();
        assert_eq!(s, Sample::new(1435781451781, 2.5));

        let s: Sample = serde_json::from_str("[12.5, 3]").unwrap();
        assert_eq!(s, Sample::new(12500, 3.0));

        let s: Sample = serde_json::from_str(r#"[0, "NaN"]"#).unwrap();
        assert!(s.value.is_nan());
    }

    #[test]
    fn sample_rejects_malformed() {
        assert!(serde_json::from_str::<Sample>(r#"[1]"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"[1, "x"]"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"[1, "2", 3]"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"t": 1}"#).is_err());
    }

    #[test]
    fn time_from_system_time() {
        let t = UNIX_EPOCH + std::time::Duration::from_millis(1500);
        assert_eq!(Time::from(t).unix_millis(), 1500);
        let before = UNIX_EPOCH - std::time::Duration::from_secs(1);
        assert_eq!(Time::from(before).unix_millis(), 0);
    }

    #[test]
    fn sortedness() {
        assert!(is_sorted(&[]));
        assert!(is_sorted(&[Sample::new(1, 0.0), Sample::new(1, 1.0), Sample::new(2, 0.0)]));
        assert!(!is_sorted(&[Sample::new(2, 0.0), Sample::new(1, 0.0)]));
    }

    #[test]
    fn point_coordinates() {
        let s = Sample::new(42, -1.5);
        assert_eq!((s.x(), s.y()), (42.0, -1.5));
        assert_eq!((3.0_f64, 4.0_f64).x(), 3.0);
    }
}
