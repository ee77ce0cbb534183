// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::{EventId, ProtoError};

/// Parse a raw event id (32 bytes, hex encoded) and normalize it to lowercase.
///
/// Bech32 `nevent` decoding belongs to the caller's identifier codec; this
/// only accepts the raw form that codec produces.
pub fn parse_event_id(input: &str) -> Result<EventId, ProtoError> {
    let trimmed = input.trim();
    let bytes =
        hex::decode(trimmed).map_err(|e| ProtoError::InvalidIdentifier(format!("{trimmed}: {e}")))?;
    if bytes.len() != 32 {
        return Err(ProtoError::InvalidIdentifier(format!(
            "{trimmed}: expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(hex::encode(bytes))
}
