//! Analytics report handlers.
//!
//! Transport-independent logic behind each ingest route: validate the report,
//! update the [`MetricsCache`](crate::state::MetricsCache), and produce the
//! reply message. The HTTP layer only extracts bodies and maps errors.

mod commands;
mod reports;

pub use commands::{CommandUsage, CommandUsageValidator};
pub use reports::{
    CountReport, ErrorReport, EventReport, record_error, record_event, record_guilds,
    record_members,
};

use crate::error::ApiResult;

/// Record one command use and describe the updated counter.
pub fn record_command(validator: &CommandUsageValidator, usage: &CommandUsage) -> ApiResult<String> {
    let reading = validator.validate_and_record(usage)?;
    Ok(format!(
        "Current command count is {} for {}",
        reading.count, reading.path
    ))
}
