//! Built-in command table used when no schema file is configured.

use super::{CommandKind, CommandSchema, SchemaError};
use std::collections::{BTreeMap, BTreeSet};

const LEAF_COMMANDS: &[&str] = &["about", "help", "invite", "ping"];

const DIRECT_COMMANDS: &[(&str, &[&str])] = &[
    ("community", &["leaderboard", "profile", "rank"]),
    ("config", &["reset", "set", "view"]),
    (
        "moderation",
        &["ban", "history", "kick", "mute", "unmute", "warn"],
    ),
];

const GROUPED_COMMANDS: &[(&str, &[(&str, &[&str])])] = &[(
    "manage",
    &[
        ("channels", &["lock", "slowmode", "unlock"]),
        ("roles", &["add", "list", "remove"]),
    ],
)];

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Build the built-in schema.
pub fn builtin() -> Result<CommandSchema, SchemaError> {
    let leaves = LEAF_COMMANDS
        .iter()
        .map(|name| (name.to_string(), CommandKind::Leaf));

    let direct = DIRECT_COMMANDS
        .iter()
        .map(|(name, subs)| (name.to_string(), CommandKind::DirectSubcommands(names(subs))));

    let grouped = GROUPED_COMMANDS.iter().map(|(name, groups)| {
        let groups: BTreeMap<String, BTreeSet<String>> = groups
            .iter()
            .map(|(group, subs)| (group.to_string(), names(subs)))
            .collect();
        (name.to_string(), CommandKind::SubcommandGroups(groups))
    });

    CommandSchema::new(leaves.chain(direct).chain(grouped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Shape;

    #[test]
    fn builtin_schema_is_valid() {
        let schema = builtin().unwrap();
        assert_eq!(
            schema.len(),
            LEAF_COMMANDS.len() + DIRECT_COMMANDS.len() + GROUPED_COMMANDS.len()
        );
    }

    #[test]
    fn builtin_schema_shapes() {
        let schema = builtin().unwrap();
        assert_eq!(schema.shape_of("ping"), Ok(Shape::Leaf));
        assert_eq!(schema.shape_of("config"), Ok(Shape::DirectSubcommands));
        assert_eq!(schema.shape_of("manage"), Ok(Shape::SubcommandGroups));
        assert!(schema.is_known_direct_subcommand("config", "set"));
        assert!(schema.is_known_subcommand_in_group("manage", "roles", "add"));
    }
}
