//! Normalization from raw source rows to [`Lead`].
//!
//! One pure function per source; each reads its columns through the source's
//! [`FieldMap`] so schema drift is handled in one place.

use chrono::{DateTime, Duration, Utc};

use super::field_map::{FieldMap, Fields, CONTACT_FIELDS, DEMO_FIELDS, ROI_FIELDS};
use super::types::{Lead, LeadSource, RawLead};

/// Leads younger than this are flagged `is_new`.
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Maximum length of [`Lead::detail`], in characters.
pub const DETAIL_MAX_CHARS: usize = 100;

const ANONYMOUS: &str = "Anonymous";

/// Normalizes one raw row, evaluating recency against `now`.
#[must_use]
pub fn normalize(raw: &RawLead, now: DateTime<Utc>) -> Lead {
    let fields = Fields::new(&raw.record);
    match raw.source {
        LeadSource::Demo => normalize_demo(&fields, now),
        LeadSource::Contact => normalize_contact(&fields, now),
        LeadSource::Roi => normalize_roi(&fields, now),
    }
}

/// `true` iff `created_at` lies less than [`RECENT_WINDOW_HOURS`] before `now`.
#[must_use]
pub fn is_recent(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(created_at) < Duration::hours(RECENT_WINDOW_HOURS)
}

/// Truncates to at most `max_chars` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_owned(),
        None => s.to_owned(),
    }
}

fn normalize_demo(fields: &Fields<'_>, now: DateTime<Utc>) -> Lead {
    let map = &DEMO_FIELDS;
    let detail = fields.text(map.detail).unwrap_or_default();
    common(LeadSource::Demo, fields, map, &detail, now)
}

fn normalize_contact(fields: &Fields<'_>, now: DateTime<Utc>) -> Lead {
    let map = &CONTACT_FIELDS;
    let detail = fields.text(map.detail).unwrap_or_default();
    common(LeadSource::Contact, fields, map, &detail, now)
}

fn normalize_roi(fields: &Fields<'_>, now: DateTime<Utc>) -> Lead {
    let map = &ROI_FIELDS;
    let revenue = fields.number(map.current_revenue).unwrap_or(0.0);
    let detail = format!("ROI: {revenue}");
    common(LeadSource::Roi, fields, map, &detail, now)
}

fn common(
    source: LeadSource,
    fields: &Fields<'_>,
    map: &FieldMap,
    detail: &str,
    now: DateTime<Utc>,
) -> Lead {
    let created_at = fields.timestamp(map.created_at).unwrap_or(now);

    Lead {
        id: fields.integer(&["id"]).unwrap_or(0),
        source,
        name: fields.text(&["name"]).unwrap_or_else(|| ANONYMOUS.to_owned()),
        email: fields.text(&["email"]).unwrap_or_default(),
        phone: fields.text(map.phone),
        company: fields.text(map.company),
        hotel_size: fields.integer(map.hotel_size),
        message: fields.text(map.message),
        detail: truncate_chars(detail, DETAIL_MAX_CHARS),
        integration_type: fields.text(map.integration_type),
        position: fields.text(map.position),
        form_type: fields.text(map.form_type),
        calculated_roi: fields.number(map.calculated_roi),
        current_revenue: fields.number(map.current_revenue),
        monthly_savings: fields.number(map.monthly_savings),
        annual_revenue: fields.number(map.annual_revenue),
        responded_at: fields.timestamp(map.responded_at),
        created_at,
        is_new: is_recent(created_at, now),
        data_processing_consent: fields.flag("data_processing_consent"),
        marketing_consent: fields.flag("marketing_consent"),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
