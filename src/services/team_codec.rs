//! Team strings such as `"Alice & Bob"` to and from ordered player names.

use std::collections::HashSet;

/// Character separating players inside a team string.
pub const DELIMITER: char = '&';
/// Separator written back when joining names.
pub const JOINER: &str = " & ";

/// Split a team string into trimmed, non-empty player names, keeping their order.
pub fn split(team: &str) -> Vec<String> {
    team.split(DELIMITER)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join player names into a team string.
pub fn join<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(JOINER)
}

/// Replace exact occurrences of `old_name` in a team string. Duplicates are left in place.
pub fn replace_in_team(team: &str, old_name: &str, new_name: &str) -> String {
    let names: Vec<String> = split(team)
        .into_iter()
        .map(|name| {
            if name == old_name {
                new_name.to_string()
            } else {
                name
            }
        })
        .collect();
    join(&names)
}

/// Whether the team string names the player.
pub fn contains(team: &str, name: &str) -> bool {
    split(team).iter().any(|player| player == name)
}

/// Whether a player appears more than once in the team string.
pub fn has_duplicates(team: &str) -> bool {
    let names = split(team);
    let unique: HashSet<&String> = names.iter().collect();
    unique.len() != names.len()
}
