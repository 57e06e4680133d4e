//! Command usage validation and dispatch.
//!
//! A usage report names a command and, depending on the command's shape, a
//! subcommand and optionally a subcommand group. Validation runs as an
//! ordered list of checks; the first check that rejects decides the
//! [`RejectionReason`], and the first that resolves a [`CounterPath`] ends
//! the cascade. Only a resolved path is ever dispatched to the cache, so a
//! rejected report mutates nothing.
//!
//! Order matters: clients rely on getting the most specific reason, and the
//! cheap presence checks run before any schema lookup.

use crate::error::RejectionReason;
use crate::schema::{CommandSchema, Shape};
use crate::state::{CounterPath, MetricsCache};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// A reported command use, as sent by the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandUsage {
    pub command: Option<String>,
    pub subcommand: Option<String>,
    pub subcommand_group: Option<String>,
}

#[cfg(test)]
impl CommandUsage {
    pub fn new(command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::default()
        }
    }

    pub fn with_subcommand(mut self, subcommand: &str) -> Self {
        self.subcommand = Some(subcommand.to_string());
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.subcommand_group = Some(group.to_string());
        self
    }
}

/// The counter a successful report incremented and its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterReading {
    pub path: CounterPath,
    pub count: u64,
}

/// Outcome of one non-terminal check.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Resolved(CounterPath),
}

type Check = fn(&UsageCheck<'_>) -> Result<Flow, RejectionReason>;

/// Checks in the order they run. [`direct_subcommand`] always follows as the
/// terminal step.
const CHECKS: &[(&str, Check)] = &[
    ("command_present", command_present),
    ("command_known", command_known),
    ("leaf_command", leaf_command),
    ("subcommand_present", subcommand_present),
    ("grouped_subcommand", grouped_subcommand),
];

/// A report under validation. Empty strings count as absent.
struct UsageCheck<'a> {
    schema: &'a CommandSchema,
    command: Option<&'a str>,
    subcommand: Option<&'a str>,
    group: Option<&'a str>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

impl<'a> UsageCheck<'a> {
    fn new(schema: &'a CommandSchema, usage: &'a CommandUsage) -> Self {
        Self {
            schema,
            command: present(&usage.command),
            subcommand: present(&usage.subcommand),
            group: present(&usage.subcommand_group),
        }
    }

    fn command(&self) -> Result<&'a str, RejectionReason> {
        self.command.ok_or(RejectionReason::MissingCommand)
    }

    fn subcommand(&self) -> Result<&'a str, RejectionReason> {
        let command = self.command()?;
        self.subcommand
            .ok_or_else(|| RejectionReason::MissingSubcommand(command.to_string()))
    }

    fn shape(&self) -> Result<Shape, RejectionReason> {
        let command = self.command()?;
        self.schema
            .shape_of(command)
            .map_err(|_| RejectionReason::UnknownCommand(command.to_string()))
    }
}

fn command_present(check: &UsageCheck<'_>) -> Result<Flow, RejectionReason> {
    check.command()?;
    Ok(Flow::Continue)
}

fn command_known(check: &UsageCheck<'_>) -> Result<Flow, RejectionReason> {
    let command = check.command()?;
    if !check.schema.is_known_command(command) {
        return Err(RejectionReason::UnknownCommand(command.to_string()));
    }
    Ok(Flow::Continue)
}

/// Leaf commands resolve on their name; any subcommand or group is ignored.
fn leaf_command(check: &UsageCheck<'_>) -> Result<Flow, RejectionReason> {
    if check.shape()? == Shape::Leaf {
        return Ok(Flow::Resolved(CounterPath::Command(
            check.command()?.to_string(),
        )));
    }
    Ok(Flow::Continue)
}

fn subcommand_present(check: &UsageCheck<'_>) -> Result<Flow, RejectionReason> {
    check.subcommand()?;
    Ok(Flow::Continue)
}

/// Handles reports that carry a group; reports without one pass through.
fn grouped_subcommand(check: &UsageCheck<'_>) -> Result<Flow, RejectionReason> {
    let Some(group) = check.group else {
        return Ok(Flow::Continue);
    };
    let command = check.command()?;
    let subcommand = check.subcommand()?;

    if check.shape()? != Shape::SubcommandGroups {
        return Err(RejectionReason::CommandHasNoGroups(command.to_string()));
    }
    if !check.schema.is_known_group(command, group) {
        return Err(RejectionReason::UnknownGroup(
            command.to_string(),
            group.to_string(),
        ));
    }
    if !check
        .schema
        .is_known_subcommand_in_group(command, group, subcommand)
    {
        return Err(RejectionReason::UnknownSubcommandInGroup(
            command.to_string(),
            group.to_string(),
            subcommand.to_string(),
        ));
    }

    Ok(Flow::Resolved(CounterPath::Grouped {
        command: command.to_string(),
        group: group.to_string(),
        subcommand: subcommand.to_string(),
    }))
}

/// Terminal step: only reached without a group.
fn direct_subcommand(check: &UsageCheck<'_>) -> Result<CounterPath, RejectionReason> {
    let command = check.command()?;
    let subcommand = check.subcommand()?;

    if check.shape()? != Shape::DirectSubcommands {
        return Err(RejectionReason::CommandHasNoDirectSubcommands(
            command.to_string(),
        ));
    }
    if !check.schema.is_known_direct_subcommand(command, subcommand) {
        return Err(RejectionReason::UnknownSubcommand(
            command.to_string(),
            subcommand.to_string(),
        ));
    }

    Ok(CounterPath::Subcommand {
        command: command.to_string(),
        subcommand: subcommand.to_string(),
    })
}

/// Run the validation cascade without touching any counter.
pub fn resolve(schema: &CommandSchema, usage: &CommandUsage) -> Result<CounterPath, RejectionReason> {
    let check = UsageCheck::new(schema, usage);
    for (name, step) in CHECKS {
        match step(&check) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Resolved(path)) => {
                debug!(check = *name, path = %path, "command usage resolved");
                return Ok(path);
            }
            Err(reason) => {
                debug!(check = *name, reason = reason.error_code(), "command usage rejected");
                return Err(reason);
            }
        }
    }

    let result = direct_subcommand(&check);
    match &result {
        Ok(path) => debug!(check = "direct_subcommand", path = %path, "command usage resolved"),
        Err(reason) => debug!(
            check = "direct_subcommand",
            reason = reason.error_code(),
            "command usage rejected"
        ),
    }
    result
}

/// Validates usage reports against the schema and records them in the cache.
#[derive(Debug, Clone)]
pub struct CommandUsageValidator {
    schema: Arc<CommandSchema>,
    cache: Arc<MetricsCache>,
}

impl CommandUsageValidator {
    pub fn new(schema: Arc<CommandSchema>, cache: Arc<MetricsCache>) -> Self {
        Self { schema, cache }
    }

    /// Validate `usage` and, if it names a real leaf, increment that counter.
    ///
    /// Exactly one counter changes on success; none change on rejection.
    pub fn validate_and_record(
        &self,
        usage: &CommandUsage,
    ) -> Result<CounterReading, RejectionReason> {
        let path = resolve(&self.schema, usage)?;
        match self.cache.increment_command(&path) {
            Some(count) => {
                debug!(path = %path, count, "command usage recorded");
                Ok(CounterReading { path, count })
            }
            None => Err(RejectionReason::DispatchFailed(path)),
        }
    }
}
