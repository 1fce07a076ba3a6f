use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use url::Url;

use super::{
    check_status, http_client, http_error, BusyInterval, CalendarProvider, ProviderError,
    ProviderResult,
};
use crate::config::CalendarConfig;

const PROVIDER: &str = "calendar";

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, CalendarBusy>,
}

#[derive(Debug, Deserialize)]
struct CalendarBusy {
    #[serde(default)]
    busy: Vec<BusyRange>,
}

#[derive(Debug, Deserialize)]
struct BusyRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Free/busy lookups against the owner's calendar
pub struct GoogleCalendar {
    client: reqwest::Client,
    endpoint: Url,
    access_token: String,
    calendar_id: String,
}

impl GoogleCalendar {
    pub fn new(config: &CalendarConfig) -> ProviderResult<Self> {
        let base = format!("{}/", config.api_base.trim_end_matches('/'));
        Ok(Self {
            client: http_client(15),
            endpoint: Url::parse(&base)?.join("freeBusy")?,
            access_token: config.access_token.clone(),
            calendar_id: config.calendar_id.clone(),
        })
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendar {
    async fn busy_intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ProviderResult<Vec<BusyInterval>> {
        if self.access_token.is_empty() {
            return Err(ProviderError::NotConfigured { provider: PROVIDER });
        }

        let body = json!({
            "timeMin": from.to_rfc3339(),
            "timeMax": to.to_rfc3339(),
            "items": [{ "id": self.calendar_id }],
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(http_error(PROVIDER))?;

        let parsed: FreeBusyResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let busy = parsed
            .calendars
            .into_values()
            .flat_map(|c| c.busy)
            .map(|range| BusyInterval {
                start: range.start,
                end: range.end,
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = busy.len(), "Fetched busy intervals");
        Ok(busy)
    }
}
