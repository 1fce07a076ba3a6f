use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::Plan;
use crate::database::UsageCounts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageMetric {
    pub current: i64,
    pub limit: Option<i32>,
    pub percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<&'static str>,
}

impl UsageMetric {
    /// `percentage` is null for unlimited (or zero) limits
    pub fn new(current: i64, limit: Option<i32>) -> Self {
        let percentage = limit
            .filter(|l| *l > 0)
            .map(|l| (current as f64 / f64::from(l) * 100.0).round() as i64);
        Self {
            current,
            limit,
            percentage,
            period: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: Uuid,
    pub name: String,
    pub max_contacts: Option<i32>,
    pub max_bookings: Option<i32>,
    pub max_services: Option<i32>,
}

impl From<&Plan> for PlanSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name.clone(),
            max_contacts: plan.max_contacts,
            max_bookings: plan.max_bookings,
            max_services: plan.max_services,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub contacts: UsageMetric,
    pub services: UsageMetric,
    pub bookings: UsageMetric,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanUsage {
    pub plan: Option<PlanSummary>,
    pub usage: Usage,
}

pub fn plan_usage(plan: Option<&Plan>, counts: UsageCounts) -> PlanUsage {
    let limit = |f: fn(&Plan) -> Option<i32>| plan.and_then(f);

    let mut bookings = UsageMetric::new(counts.bookings_this_period, limit(|p| p.max_bookings));
    bookings.period = Some("month");

    PlanUsage {
        plan: plan.map(PlanSummary::from),
        usage: Usage {
            contacts: UsageMetric::new(counts.contacts, limit(|p| p.max_contacts)),
            services: UsageMetric::new(counts.services, limit(|p| p.max_services)),
            bookings,
        },
    }
}

/// Creating one more of a resource would exceed the plan's limit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label} limit reached ({current}/{limit}). Upgrade your plan for more {plural}.")]
pub struct LimitReached {
    pub label: &'static str,
    pub plural: &'static str,
    pub current: i64,
    pub limit: i32,
}

/// Room for one more service under the plan; no plan or no limit is unlimited
pub fn check_service_limit(plan: Option<&Plan>, counts: &UsageCounts) -> Result<(), LimitReached> {
    match plan.and_then(|p| p.max_services) {
        Some(limit) if counts.services >= i64::from(limit) => Err(LimitReached {
            label: "Service",
            plural: "services",
            current: counts.services,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Midnight UTC on the first of the month containing `now`
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}
