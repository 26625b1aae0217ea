//! Input schema for a single vehicle and its cache-key canonicalization.
//!
//! Validation is permissive: only presence and primitive kind are
//! checked. Negative mileage or zero seats are accepted as-is.

use crate::domain::errors::{FieldKind, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Categorical and free-text attributes, in the order the encoder consumes them.
pub const CATEGORICAL_FEATURES: &[&str] =
    &["company", "model", "fuel", "seller_type", "transmission"];

/// Numeric attributes, in the order the encoder consumes them.
pub const NUMERIC_FEATURES: &[&str] = &[
    "km_driven",
    "mileage_mpg",
    "engine_cc",
    "max_power_bhp",
    "seats",
    "age",
];

/// One vehicle, as submitted for pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub company: String,
    pub model: String,
    pub fuel: String,
    pub seller_type: String,
    pub transmission: String,
    pub km_driven: f64,
    pub mileage_mpg: f64,
    pub engine_cc: f64,
    pub max_power_bhp: f64,
    pub seats: i64,
    /// Years since first registration. Absent means "unknown" and is
    /// normalized to 0 at serving time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

/// Deterministic fingerprint of a normalized [`FeatureRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FeatureRecord {
    /// Builds a record from an arbitrary JSON value.
    ///
    /// Unknown fields are ignored. `age` may be missing or `null`.
    pub fn validate(raw: &Value) -> Result<Self, SchemaError> {
        let obj = raw.as_object().ok_or(SchemaError::NotAnObject)?;

        Ok(Self {
            company: required_str(obj, "company")?,
            model: required_str(obj, "model")?,
            fuel: required_str(obj, "fuel")?,
            seller_type: required_str(obj, "seller_type")?,
            transmission: required_str(obj, "transmission")?,
            km_driven: required_f64(obj, "km_driven")?,
            mileage_mpg: required_f64(obj, "mileage_mpg")?,
            engine_cc: required_f64(obj, "engine_cc")?,
            max_power_bhp: required_f64(obj, "max_power_bhp")?,
            seats: required_int(obj, "seats")?,
            age: optional_int(obj, "age")?,
        })
    }

    /// Parses a request body and validates it in one step.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, SchemaError> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|e| SchemaError::MalformedJson(e.to_string()))?;
        Self::validate(&raw)
    }

    /// Fills defaults for optional fields. Only `age` has one.
    pub fn normalize(mut self) -> Self {
        if self.age.is_none() {
            self.age = Some(0);
        }
        self
    }

    /// Numeric attributes in [`NUMERIC_FEATURES`] order.
    pub fn numeric_values(&self) -> [f64; 6] {
        [
            self.km_driven,
            self.mileage_mpg,
            self.engine_cc,
            self.max_power_bhp,
            self.seats as f64,
            self.age.unwrap_or(0) as f64,
        ]
    }

    /// Categorical attributes in [`CATEGORICAL_FEATURES`] order.
    pub fn categorical_values(&self) -> [&str; 5] {
        [
            &self.company,
            &self.model,
            &self.fuel,
            &self.seller_type,
            &self.transmission,
        ]
    }

    /// Canonical JSON of all fields with keys sorted by name.
    ///
    /// A missing `age` is keyed as 0, so an omitted age and an explicit 0
    /// share cache entries. Likewise `-0.0` keys as `0.0`.
    pub fn cache_key(&self) -> CacheKey {
        // Inserted in lexicographic order; the map then serializes sorted
        // whether or not serde_json preserves insertion order.
        let pairs: [(&str, Value); 11] = [
            ("age", Value::from(self.age.unwrap_or(0))),
            ("company", Value::from(self.company.as_str())),
            ("engine_cc", magnitude(self.engine_cc)),
            ("fuel", Value::from(self.fuel.as_str())),
            ("km_driven", magnitude(self.km_driven)),
            ("max_power_bhp", magnitude(self.max_power_bhp)),
            ("mileage_mpg", magnitude(self.mileage_mpg)),
            ("model", Value::from(self.model.as_str())),
            ("seats", Value::from(self.seats)),
            ("seller_type", Value::from(self.seller_type.as_str())),
            ("transmission", Value::from(self.transmission.as_str())),
        ];

        let map: Map<String, Value> = pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        CacheKey(Value::Object(map).to_string())
    }
}

// Adding +0.0 turns -0.0 into 0.0 and leaves every other value unchanged.
fn magnitude(value: f64) -> Value {
    Value::from(value + 0.0)
}

fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, SchemaError> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(SchemaError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn required_str(obj: &Map<String, Value>, name: &'static str) -> Result<String, SchemaError> {
    field(obj, name)?
        .as_str()
        .map(str::to_owned)
        .ok_or(SchemaError::WrongKind {
            field: name,
            expected: FieldKind::String,
        })
}

fn required_f64(obj: &Map<String, Value>, name: &'static str) -> Result<f64, SchemaError> {
    field(obj, name)?.as_f64().ok_or(SchemaError::WrongKind {
        field: name,
        expected: FieldKind::Number,
    })
}

fn required_int(obj: &Map<String, Value>, name: &'static str) -> Result<i64, SchemaError> {
    as_integer(field(obj, name)?).ok_or(SchemaError::WrongKind {
        field: name,
        expected: FieldKind::Integer,
    })
}

fn optional_int(obj: &Map<String, Value>, name: &'static str) -> Result<Option<i64>, SchemaError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_integer(value)
            .map(Some)
            .ok_or(SchemaError::WrongKind {
                field: name,
                expected: FieldKind::Integer,
            }),
    }
}

/// Accepts JSON integers and integral floats (`5` and `5.0`), rejects `5.5`.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn swift() -> Value {
        json!({
            "company": "Maruti",
            "model": "Swift",
            "fuel": "Petrol",
            "seller_type": "Individual",
            "transmission": "Manual",
            "km_driven": 50000,
            "mileage_mpg": 45.0,
            "engine_cc": 1200.0,
            "max_power_bhp": 80.0,
            "seats": 5
        })
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        let record = FeatureRecord::validate(&swift()).unwrap();
        assert_eq!(record.company, "Maruti");
        assert_eq!(record.km_driven, 50000.0);
        assert_eq!(record.seats, 5);
        assert_eq!(record.age, None);
    }

    #[test]
    fn test_validate_reports_missing_field() {
        let mut raw = swift();
        raw.as_object_mut().unwrap().remove("company");
        let err = FeatureRecord::validate(&raw).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField("company")));
    }

    #[test]
    fn test_validate_rejects_null_required_field() {
        let mut raw = swift();
        raw["fuel"] = Value::Null;
        assert!(matches!(
            FeatureRecord::validate(&raw),
            Err(SchemaError::MissingField("fuel"))
        ));
    }

    #[test]
    fn test_validate_rejects_non_numeric_mileage() {
        let mut raw = swift();
        raw["mileage_mpg"] = json!("45 mpg");
        let err = FeatureRecord::validate(&raw).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::WrongKind {
                field: "mileage_mpg",
                expected: FieldKind::Number
            }
        ));
    }

    #[test]
    fn test_validate_rejects_fractional_seats() {
        let mut raw = swift();
        raw["seats"] = json!(5.5);
        assert!(FeatureRecord::validate(&raw).is_err());

        raw["seats"] = json!(5.0);
        assert_eq!(FeatureRecord::validate(&raw).unwrap().seats, 5);
    }

    #[test]
    fn test_validate_is_permissive_on_ranges() {
        let mut raw = swift();
        raw["km_driven"] = json!(-10.0);
        raw["age"] = json!(-3);
        let record = FeatureRecord::validate(&raw).unwrap();
        assert_eq!(record.km_driven, -10.0);
        assert_eq!(record.age, Some(-3));
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert!(matches!(
            FeatureRecord::validate(&json!([1, 2, 3])),
            Err(SchemaError::NotAnObject)
        ));
    }

    #[test]
    fn test_from_json_slice_reports_syntax_errors() {
        let err = FeatureRecord::from_json_slice(b"{not json").unwrap_err();
        assert!(matches!(err, SchemaError::MalformedJson(_)));
    }

    #[test]
    fn test_normalize_defaults_age_to_zero() {
        let record = FeatureRecord::validate(&swift()).unwrap().normalize();
        assert_eq!(record.age, Some(0));

        let mut raw = swift();
        raw["age"] = json!(7);
        let record = FeatureRecord::validate(&raw).unwrap().normalize();
        assert_eq!(record.age, Some(7));
    }

    #[test]
    fn test_omitted_age_keys_like_explicit_zero() {
        let omitted = FeatureRecord::validate(&swift()).unwrap().normalize();
        let mut raw = swift();
        raw["age"] = json!(0);
        let explicit = FeatureRecord::validate(&raw).unwrap().normalize();
        assert_eq!(omitted.cache_key(), explicit.cache_key());
    }

    #[test]
    fn test_cache_key_ignores_field_order() {
        let reordered = json!({
            "seats": 5,
            "max_power_bhp": 80.0,
            "engine_cc": 1200.0,
            "mileage_mpg": 45.0,
            "km_driven": 50000,
            "transmission": "Manual",
            "seller_type": "Individual",
            "fuel": "Petrol",
            "model": "Swift",
            "company": "Maruti"
        });
        let a = FeatureRecord::validate(&swift()).unwrap().normalize();
        let b = FeatureRecord::validate(&reordered).unwrap().normalize();
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_differs_on_any_field() {
        let base = FeatureRecord::validate(&swift()).unwrap().normalize();
        let base_key = base.cache_key();

        let vary = |change: fn(&mut FeatureRecord)| {
            let mut record = base.clone();
            change(&mut record);
            record
        };
        let variants = [
            vary(|r| r.company = "Hyundai".into()),
            vary(|r| r.model = "Alto".into()),
            vary(|r| r.fuel = "Diesel".into()),
            vary(|r| r.seller_type = "Dealer".into()),
            vary(|r| r.transmission = "Automatic".into()),
            vary(|r| r.km_driven = 50001.0),
            vary(|r| r.mileage_mpg = 44.5),
            vary(|r| r.engine_cc = 1300.0),
            vary(|r| r.max_power_bhp = 81.0),
            vary(|r| r.seats = 7),
            vary(|r| r.age = Some(3)),
        ];
        for variant in variants {
            assert_ne!(variant.cache_key(), base_key, "{variant:?}");
        }
    }

    #[test]
    fn test_negative_zero_keys_like_zero() {
        let mut raw = swift();
        raw["km_driven"] = json!(0.0);
        let zero = FeatureRecord::validate(&raw).unwrap().normalize();
        let negative_zero = FeatureRecord {
            km_driven: -0.0,
            ..zero.clone()
        };
        assert_eq!(zero.cache_key(), negative_zero.cache_key());
    }

    #[test]
    fn test_cache_key_is_sorted_json() {
        let key = FeatureRecord::validate(&swift()).unwrap().normalize().cache_key();
        let parsed: Map<String, Value> = serde_json::from_str(key.as_str()).unwrap();
        let names: Vec<&String> = parsed.keys().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(parsed.len(), 11);
        assert!(key.as_str().starts_with("{\"age\":0,\"company\":\"Maruti\""));
    }
}
