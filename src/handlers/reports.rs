//! Single-field analytics reports: guild, member, error and event counts.
//!
//! Each function checks the one required field, updates the cache and
//! returns the message sent back to the bot.

use crate::error::{ApiError, ApiResult};
use crate::state::MetricsCache;
use serde::Deserialize;

/// Body of `POST /guilds` and `POST /members`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountReport {
    pub count: Option<u64>,
}

/// Body of `POST /errors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorReport {
    pub handled: Option<bool>,
}

/// Body of `POST /events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventReport {
    pub event: Option<String>,
}

const NO_COUNT: &str = "No count provided.";

pub fn record_guilds(cache: &MetricsCache, report: &CountReport) -> ApiResult<String> {
    let count = report.count.ok_or(ApiError::MissingField(NO_COUNT))?;
    let count = cache.set_guild_count(count);
    Ok(format!("Current guild count is {count}"))
}

pub fn record_members(cache: &MetricsCache, report: &CountReport) -> ApiResult<String> {
    let count = report.count.ok_or(ApiError::MissingField(NO_COUNT))?;
    let count = cache.set_member_count(count);
    Ok(format!("Current member count is {count}"))
}

pub fn record_error(cache: &MetricsCache, report: &ErrorReport) -> ApiResult<String> {
    let handled = report
        .handled
        .ok_or(ApiError::MissingField("Was this error handled or not?"))?;
    let counts = cache.record_error(handled);
    Ok(format!(
        "Current error count is {} handled and {} unhandled",
        counts.handled, counts.unhandled
    ))
}

pub fn record_event(cache: &MetricsCache, report: &EventReport) -> ApiResult<String> {
    let event = report
        .event
        .as_deref()
        .filter(|event| !event.is_empty())
        .ok_or(ApiError::MissingField("No event name provided."))?;
    let count = cache
        .record_event(event)
        .ok_or_else(|| ApiError::UnknownEvent(event.to_string()))?;
    Ok(format!("Current event count is {count} for {event}"))
}
