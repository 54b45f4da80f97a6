//! Player directory: contact phones keyed by display name.

use serde_json::Value;
use tracing::info;

use crate::{
    dao::{
        document::{Collection, Fields, Payload, WriteOp},
        models::{PlayerEntity, fields},
        rules::GuardedStore,
    },
    dto::players::{PhoneRequest, PhoneResponse},
    error::ServiceError,
    services::require_admin,
};

/// Keep only the ASCII digits of a typed phone number.
pub fn normalize_phone(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Set, replace or clear the phone of `player`.
///
/// An input without digits clears the entry, which needs an existing phone and confirmation.
pub async fn set_phone(
    store: &GuardedStore,
    player: &str,
    request: &PhoneRequest,
) -> Result<PhoneResponse, ServiceError> {
    require_admin(store)?;
    let player = player.trim();
    if player.is_empty() {
        return Err(ServiceError::InvalidInput("Player name is required".into()));
    }

    let digits = normalize_phone(&request.phone);
    if digits.is_empty() {
        return clear_phone(store, player, request.confirm).await;
    }

    let mut entry = Fields::new();
    entry.insert(fields::PHONE.into(), Value::String(digits.clone()));
    store
        .write(WriteOp::Set {
            collection: Collection::Players,
            id: player.to_string(),
            payload: Payload::new(entry).with_server_timestamp(fields::UPDATED_AT),
            merge: true,
        })
        .await?;
    info!(player, "phone saved");

    Ok(PhoneResponse {
        player: player.to_string(),
        phone: Some(digits),
        message: "Phone saved".into(),
    })
}

async fn clear_phone(
    store: &GuardedStore,
    player: &str,
    confirm: bool,
) -> Result<PhoneResponse, ServiceError> {
    let current = match store.get(Collection::Players, player).await? {
        Some(document) => document
            .decode::<PlayerEntity>()
            .map(|entity| entity.phone)
            .unwrap_or_default(),
        None => String::new(),
    };
    if current.is_empty() {
        return Ok(PhoneResponse {
            player: player.to_string(),
            phone: None,
            message: "No phone to clear".into(),
        });
    }
    if !confirm {
        return Err(ServiceError::ConfirmationRequired(format!(
            "Clear phone for {player}?"
        )));
    }

    store
        .write(WriteOp::Delete {
            collection: Collection::Players,
            id: player.to_string(),
        })
        .await?;
    info!(player, "phone cleared");

    Ok(PhoneResponse {
        player: player.to_string(),
        phone: None,
        message: "Phone cleared".into(),
    })
}
