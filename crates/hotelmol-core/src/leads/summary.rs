//! Dashboard read models derived from normalized leads.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::normalize::truncate_chars;
use super::types::{DailyLeadCount, LatestLead, Lead, LeadStats};

pub const DEFAULT_DAILY_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_LATEST_LIMIT: usize = 5;
const LATEST_DETAIL_MAX_CHARS: usize = 40;

#[must_use]
pub fn summarize(leads: &[Lead]) -> LeadStats {
    LeadStats {
        total_leads: leads.len(),
        new_leads: leads.iter().filter(|lead| lead.is_new).count(),
    }
}

/// Per-UTC-day counts for leads created within the last `days` days, oldest first.
///
/// A window reaching past the representable date range has no lower bound.
#[must_use]
pub fn daily_counts(leads: &[Lead], now: DateTime<Utc>, days: i64) -> Vec<DailyLeadCount> {
    let since = Duration::try_days(days).and_then(|window| now.checked_sub_signed(window));
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for lead in leads
        .iter()
        .filter(|lead| since.is_none_or(|since| lead.created_at > since))
    {
        *by_day.entry(lead.created_at.date_naive()).or_default() += 1;
    }

    by_day
        .into_iter()
        .map(|(date, count)| DailyLeadCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// The `limit` most recent leads, newest first.
#[must_use]
pub fn latest_leads(leads: &[Lead], limit: usize) -> Vec<LatestLead> {
    let mut ordered: Vec<&Lead> = leads.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    ordered
        .into_iter()
        .take(limit)
        .map(|lead| LatestLead {
            id: lead.id,
            source: lead.source,
            name: lead.name.clone(),
            detail: truncate_chars(&lead.detail, LATEST_DETAIL_MAX_CHARS),
            company: lead.company.clone(),
            integration_type: lead.integration_type.clone(),
            created_at: lead.created_at,
            is_new: lead.is_new,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::leads::{normalize, LeadSource, RawLead};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn lead_at(source: LeadSource, id: i64, created_at: DateTime<Utc>) -> Lead {
        let record = json!({
            "id": id,
            "subject": "A subject line that is definitely longer than forty characters",
            "created_at": created_at.to_rfc3339(),
            "submitted_at": created_at.to_rfc3339(),
        });
        normalize(
            &RawLead::new(source, record.as_object().cloned().unwrap()),
            now(),
        )
    }

    #[test]
    fn summarize_counts_new_leads() {
        let leads = vec![
            lead_at(LeadSource::Demo, 1, now() - Duration::hours(1)),
            lead_at(LeadSource::Roi, 1, now() - Duration::hours(23)),
            lead_at(LeadSource::Contact, 1, now() - Duration::hours(25)),
        ];
        let stats = summarize(&leads);
        assert_eq!(stats.total_leads, 3);
        assert_eq!(stats.new_leads, 2);
    }

    #[test]
    fn daily_counts_group_by_utc_day_and_skip_old_leads() {
        let leads = vec![
            lead_at(LeadSource::Demo, 1, now() - Duration::hours(1)),
            lead_at(LeadSource::Contact, 1, now() - Duration::hours(2)),
            lead_at(LeadSource::Roi, 1, now() - Duration::days(3)),
            lead_at(LeadSource::Roi, 2, now() - Duration::days(45)),
        ];
        let counts = daily_counts(&leads, now(), DEFAULT_DAILY_WINDOW_DAYS);
        assert_eq!(
            counts,
            vec![
                DailyLeadCount {
                    date: "2025-06-12".to_owned(),
                    count: 1
                },
                DailyLeadCount {
                    date: "2025-06-15".to_owned(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn daily_counts_with_huge_window_keeps_every_lead() {
        let leads = vec![
            lead_at(LeadSource::Demo, 1, now() - Duration::hours(1)),
            lead_at(LeadSource::Roi, 2, now() - Duration::days(4_000)),
        ];

        for days in [i64::MAX, i64::MAX / 86_400, 200_000_000] {
            let counts = daily_counts(&leads, now(), days);
            let total: usize = counts.iter().map(|day| day.count).sum();
            assert_eq!(total, 2, "window of {days} days");
        }
    }

    #[test]
    fn latest_leads_are_newest_first_with_short_detail() {
        let leads = vec![
            lead_at(LeadSource::Contact, 1, now() - Duration::days(2)),
            lead_at(LeadSource::Contact, 2, now() - Duration::hours(1)),
            lead_at(LeadSource::Contact, 3, now() - Duration::days(1)),
        ];
        let latest = latest_leads(&leads, 2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, 2);
        assert_eq!(latest[1].id, 3);
        assert!(latest[0].detail.chars().count() <= 40);
    }
}
