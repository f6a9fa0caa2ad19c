//! Plaintext shapes sealed into password and note records.
//!
//! Payloads are serialised to JSON before sealing. Files are sealed as raw
//! bytes and have no payload type.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// A stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordEntry {
    pub website: Option<String>,
    pub username: String,
    pub password: String,
}

/// A secure note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
}

pub(crate) fn to_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, VaultError> {
    Ok(serde_json::to_vec(payload)?)
}

pub(crate) fn from_bytes<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, VaultError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_entry_json_shape() {
        let entry = PasswordEntry {
            website: None,
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let json: serde_json::Value = serde_json::from_slice(&to_bytes(&entry).unwrap()).unwrap();
        assert_eq!(json["website"], serde_json::Value::Null);
        assert_eq!(json["username"], "alice");
        assert_eq!(from_bytes::<PasswordEntry>(&to_bytes(&entry).unwrap()).unwrap(), entry);
    }

    #[test]
    fn garbage_is_a_payload_error() {
        assert!(matches!(
            from_bytes::<Note>(b"\x00\x01"),
            Err(VaultError::Payload(_))
        ));
    }
}
