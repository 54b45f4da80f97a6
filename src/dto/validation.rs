//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::services::team_codec;

/// Validates a player display name used as a rename target or directory key.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Alice")       // Ok
/// validate_player_name("   ")         // Err - blank
/// validate_player_name("Alice & Bob") // Err - contains the team delimiter
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    if name.contains(team_codec::DELIMITER) {
        let mut err = ValidationError::new("player_name_delimiter");
        err.message = Some(
            format!(
                "Player name must not contain '{}' (it separates teammates)",
                team_codec::DELIMITER
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}
