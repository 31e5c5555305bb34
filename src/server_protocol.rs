use serde_json::Value;

use crate::types::Action;

#[derive(Debug)]
pub enum ParsedClientMessage {
    Register { uid: String },
    Act { action: Action },
    Rename { name: String },
}

/// Fields a client may set through the REST player resource. An invalid
/// value for a present field rejects the whole message; absent fields are
/// simply left alone.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    pub action: Option<Action>,
    pub name: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AdminCommand {
    pub spawn: bool,
}

/// Socket intake accepts either a JSON object or a bare action word, so a
/// human poking at the socket with a plain "UP" still gets moved.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        let action = Action::parse(raw.trim())?;
        return Some(ParsedClientMessage::Act { action });
    };
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "register" => {
            let uid = object.get("uid")?.as_str()?.to_string();
            Some(ParsedClientMessage::Register { uid })
        }
        "action" => {
            let action = Action::parse(object.get("action")?.as_str()?)?;
            Some(ParsedClientMessage::Act { action })
        }
        "rename" => {
            let name = object.get("name")?.as_str()?.to_string();
            Some(ParsedClientMessage::Rename { name })
        }
        _ => None,
    }
}

pub fn parse_player_update(raw: &str) -> Option<PlayerUpdate> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let action = match object.get("action") {
        None => None,
        Some(value) => Some(Action::parse(value.as_str()?)?),
    };
    let name = match object.get("name") {
        None => None,
        Some(value) => Some(value.as_str()?.to_string()),
    };
    Some(PlayerUpdate { action, name })
}

pub fn parse_admin_command(raw: &str) -> Option<AdminCommand> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let spawn = match object.get("spawn") {
        None => false,
        Some(value) => value.as_bool()?,
    };
    Some(AdminCommand { spawn })
}
