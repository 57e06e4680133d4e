//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "analyticsd".to_string()
}

// =============================================================================
// Event Defaults
// =============================================================================

/// Gateway events the bot reports by default.
pub const DEFAULT_EVENTS: &[&str] = &[
    "guildCreate",
    "guildDelete",
    "guildMemberAdd",
    "guildMemberRemove",
    "guildMemberUpdate",
    "interactionCreate",
    "messageCreate",
    "messageDelete",
    "messageUpdate",
    "threadCreate",
    "userUpdate",
    "voiceStateUpdate",
];

pub fn default_events() -> Vec<String> {
    DEFAULT_EVENTS.iter().map(|e| e.to_string()).collect()
}
