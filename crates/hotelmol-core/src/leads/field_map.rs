//! Per-source column mapping for the three lead tables.
//!
//! Each source table has drifted across schema revisions (`submitted_at` vs
//! `created_at`, `hotel_name` vs `company`). A [`FieldMap`] lists, for every
//! unified field, the source columns to try in order. An empty list means the
//! field does not apply to that source and always resolves to `None`.
//!
//! When none of the `created_at` candidates parse, the normalizer falls back to
//! the processing time. That keeps malformed legacy rows visible, but it also
//! flags them as new; do not rely on it for well-formed data.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::instant::parse_instant;
use super::types::LeadSource;

type Keys = &'static [&'static str];

#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub created_at: Keys,
    pub phone: Keys,
    pub company: Keys,
    pub message: Keys,
    pub position: Keys,
    pub integration_type: Keys,
    pub form_type: Keys,
    pub hotel_size: Keys,
    pub responded_at: Keys,
    pub calculated_roi: Keys,
    pub current_revenue: Keys,
    pub monthly_savings: Keys,
    pub annual_revenue: Keys,
    /// Column feeding the short `detail` string, when it is copied verbatim.
    pub detail: Keys,
}

pub const DEMO_FIELDS: FieldMap = FieldMap {
    created_at: &["submitted_at", "created_at"],
    phone: &["phone"],
    company: &["hotel_name", "company"],
    message: &["message"],
    position: &["position"],
    integration_type: &[],
    form_type: &["form_type"],
    hotel_size: &[],
    responded_at: &[],
    calculated_roi: &[],
    current_revenue: &[],
    monthly_savings: &[],
    annual_revenue: &[],
    detail: &["form_type"],
};

pub const CONTACT_FIELDS: FieldMap = FieldMap {
    created_at: &["created_at", "submitted_at"],
    phone: &["phone"],
    company: &["company", "hotel_name"],
    message: &["message"],
    position: &["position"],
    integration_type: &["integration_type"],
    form_type: &[],
    hotel_size: &[],
    responded_at: &["responded_at"],
    calculated_roi: &[],
    current_revenue: &[],
    monthly_savings: &[],
    annual_revenue: &[],
    detail: &["subject"],
};

pub const ROI_FIELDS: FieldMap = FieldMap {
    created_at: &["submitted_at", "created_at"],
    phone: &["phone"],
    company: &["hotel_name", "company"],
    message: &[],
    position: &[],
    integration_type: &[],
    form_type: &[],
    hotel_size: &["hotel_size"],
    responded_at: &[],
    calculated_roi: &["calculated_roi"],
    current_revenue: &["current_revenue"],
    monthly_savings: &["monthly_savings"],
    annual_revenue: &["annual_revenue"],
    detail: &[],
};

impl FieldMap {
    #[must_use]
    pub fn for_source(source: LeadSource) -> &'static FieldMap {
        match source {
            LeadSource::Demo => &DEMO_FIELDS,
            LeadSource::Contact => &CONTACT_FIELDS,
            LeadSource::Roi => &ROI_FIELDS,
        }
    }
}

/// Typed accessors over a raw record. JSON `null` and blank strings count as absent.
pub(crate) struct Fields<'a> {
    record: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(record: &'a Map<String, Value>) -> Self {
        Self { record }
    }

    fn candidates(&self, keys: Keys) -> impl Iterator<Item = &'a Value> {
        let record = self.record;
        keys.iter()
            .filter_map(move |key| record.get(*key))
            .filter(|value| !value.is_null())
    }

    pub(crate) fn text(&self, keys: Keys) -> Option<String> {
        self.candidates(keys).find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(crate) fn number(&self, keys: Keys) -> Option<f64> {
        self.candidates(keys)
            .find_map(|value| match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|n| n.is_finite())
    }

    pub(crate) fn integer(&self, keys: Keys) -> Option<i64> {
        self.candidates(keys).find_map(|value| match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
            }
            _ => None,
        })
    }

    pub(crate) fn timestamp(&self, keys: Keys) -> Option<DateTime<Utc>> {
        self.candidates(keys).find_map(|value| match value {
            Value::String(s) => parse_instant(s),
            _ => None,
        })
    }

    pub(crate) fn flag(&self, key: &str) -> bool {
        matches!(self.record.get(key), Some(Value::Bool(true)))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole_number(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15).then_some(n as i64)
}
