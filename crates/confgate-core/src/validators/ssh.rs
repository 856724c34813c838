//! OpenSSH public key lines (`authorized_keys` format)

use super::expect_str;
use crate::registry::{CheckResult, ValidatorContext};
use crate::value::Value;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Key types accepted in the first field
pub const SSH_KEY_TYPES: [&str; 8] = [
    "ssh-ed25519",
    "ssh-rsa",
    "ssh-dss",
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    "sk-ssh-ed25519@openssh.com",
    "sk-ecdsa-sha2-nistp256@openssh.com",
];

/// Read the length-prefixed key type at the start of the decoded blob
fn embedded_type(blob: &[u8]) -> Option<&str> {
    let len_bytes: [u8; 4] = blob.get(..4)?.try_into().ok()?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    let name = blob.get(4..4usize.checked_add(len)?)?;
    std::str::from_utf8(name).ok()
}

/// `<type> <base64 payload> [comment]`
pub fn ssh_public_key(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    let line = expect_str(value)?.trim();
    let mut parts = line.split_whitespace();
    let (Some(key_type), Some(payload)) = (parts.next(), parts.next()) else {
        return Err("SSH public key must have the form '<type> <base64-key> [comment]'".to_string());
    };
    if !SSH_KEY_TYPES.contains(&key_type) {
        return Err(format!("unsupported SSH key type '{}'", key_type));
    }
    let blob = STANDARD
        .decode(payload)
        .map_err(|e| format!("SSH key payload is not valid base64: {}", e))?;
    match embedded_type(&blob) {
        Some(embedded) if embedded == key_type => Ok(()),
        Some(embedded) => Err(format!(
            "SSH key declares type '{}' but its payload encodes '{}'",
            key_type, embedded
        )),
        None => Err("SSH key payload is truncated".to_string()),
    }
}
