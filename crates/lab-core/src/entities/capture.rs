use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::field::FieldSchema;
use crate::enums::DataType;
use crate::errors::CoreError;
use crate::ids::{FieldId, InstanceId};
use crate::range::{evaluate_range, parse_number};

/// A captured value, typed by the field's declared data type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "data_type", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    Text(String),
    Number(f64),
    Select(String),
    Boolean(bool),
    Longtext(String),
}

impl ResultValue {
    /// Parse raw technician input against a field definition.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::TypeMismatch` if `raw` does not conform to the
    /// field's data type. Values are rejected, never coerced.
    pub fn parse(field: &FieldSchema, raw: &str) -> Result<Self, CoreError> {
        let mismatch = || CoreError::TypeMismatch {
            field: field.name.clone(),
            data_type: field.data_type,
            value: raw.to_string(),
        };

        match field.data_type {
            DataType::Number => parse_number(raw).map(Self::Number).ok_or_else(mismatch),
            DataType::Boolean => parse_bool(raw).map(Self::Boolean).ok_or_else(mismatch),
            DataType::Select if field.options.is_empty() => Ok(Self::Select(raw.trim().to_string())),
            DataType::Select => field
                .match_option(raw)
                .map(|opt| Self::Select(opt.to_string()))
                .ok_or_else(mismatch),
            DataType::Text => Ok(Self::Text(raw.trim().to_string())),
            DataType::Longtext => Ok(Self::Longtext(raw.to_string())),
        }
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Text(_) => DataType::Text,
            Self::Number(_) => DataType::Number,
            Self::Select(_) => DataType::Select,
            Self::Boolean(_) => DataType::Boolean,
            Self::Longtext(_) => DataType::Longtext,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Select(s) | Self::Longtext(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "si" | "sí" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// One recorded value for one field on one exam instance.
///
/// Unit, reference, section and order are copied from the field at capture
/// time so later catalog edits never rewrite historical results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultCapture {
    pub instance_id: InstanceId,
    pub field_id: FieldId,
    pub field_name: String,
    pub value: ResultValue,
    pub unit: Option<String>,
    pub reference: Option<String>,
    pub out_of_range: bool,
    pub observations: Option<String>,
    pub section: Option<String>,
    pub order: u32,
    pub captured_at: DateTime<Utc>,
}

impl ResultCapture {
    /// Build a capture from raw input, evaluating it against the field's reference.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::TypeMismatch` if `raw` does not parse as the field's type.
    pub fn record(
        instance_id: InstanceId,
        field: &FieldSchema,
        raw: &str,
        observations: Option<&str>,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let value = ResultValue::parse(field, raw)?;
        let out_of_range = evaluate_range(&value, field.reference.as_deref());

        Ok(Self {
            instance_id,
            field_id: field.id,
            field_name: field.name.clone(),
            value,
            unit: field.unit.clone(),
            reference: field.reference.clone(),
            out_of_range,
            observations: observations
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            section: field.section.clone(),
            order: field.order,
            captured_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(data_type: DataType, reference: Option<&str>) -> FieldSchema {
        FieldSchema {
            id: FieldId(7),
            name: "Resultado".into(),
            data_type,
            unit: Some("mg/dL".into()),
            reference: reference.map(String::from),
            section: Some("Bioquímica".into()),
            order: 3,
            required: true,
            options: Vec::new(),
        }
    }

    #[test]
    fn number_accepts_decimal_comma() {
        let f = field(DataType::Number, None);
        assert_eq!(ResultValue::parse(&f, "4,5").unwrap(), ResultValue::Number(4.5));
        assert_eq!(ResultValue::parse(&f, " 120 ").unwrap(), ResultValue::Number(120.0));
    }

    #[test]
    fn number_rejects_text() {
        let f = field(DataType::Number, None);
        let err = ResultValue::parse(&f, "alto").unwrap_err();
        assert!(matches!(
            err,
            CoreError::TypeMismatch { data_type: DataType::Number, .. }
        ));
    }

    #[test]
    fn boolean_accepts_spanish_yes() {
        let f = field(DataType::Boolean, None);
        assert_eq!(ResultValue::parse(&f, "Sí").unwrap(), ResultValue::Boolean(true));
        assert_eq!(ResultValue::parse(&f, "no").unwrap(), ResultValue::Boolean(false));
        assert!(ResultValue::parse(&f, "maybe").is_err());
    }

    #[test]
    fn select_must_match_an_option() {
        let mut f = field(DataType::Select, None);
        f.options = vec!["Negativo".into(), "Positivo".into()];
        assert_eq!(
            ResultValue::parse(&f, "positivo").unwrap(),
            ResultValue::Select("Positivo".into())
        );
        assert!(ResultValue::parse(&f, "dudoso").is_err());
    }

    #[test]
    fn record_copies_field_snapshot() {
        let f = field(DataType::Number, Some("70-110"));
        let now = Utc::now();
        let capture =
            ResultCapture::record(InstanceId(1), &f, "150", Some("  hemolizada "), now).unwrap();

        assert_eq!(capture.field_id, FieldId(7));
        assert_eq!(capture.unit.as_deref(), Some("mg/dL"));
        assert_eq!(capture.reference.as_deref(), Some("70-110"));
        assert_eq!(capture.section.as_deref(), Some("Bioquímica"));
        assert_eq!(capture.order, 3);
        assert_eq!(capture.observations.as_deref(), Some("hemolizada"));
        assert!(capture.out_of_range);
    }

    #[test]
    fn blank_observations_are_dropped() {
        let f = field(DataType::Text, Some("negativo"));
        let capture = ResultCapture::record(InstanceId(1), &f, "Negativo", Some("   "), Utc::now())
            .unwrap();
        assert_eq!(capture.observations, None);
        assert!(!capture.out_of_range);
    }

    #[test]
    fn value_display_is_plain() {
        assert_eq!(ResultValue::Number(95.0).to_string(), "95");
        assert_eq!(ResultValue::Number(4.25).to_string(), "4.25");
        assert_eq!(ResultValue::Boolean(true).to_string(), "true");
    }
}
