use lodestone::shared::{ProtocolError, ProtocolResult};

/// Longest admissible username body, in bytes.
pub const USERNAME_MAX: usize = 18;

// Longest admissible confirmation body, in digits
const CONFIRMATION_MAX: usize = 5;

/// Hashing offsets shared with the robot fleet, indexed by the key id the
/// client picks during the handshake. Process-wide read-only configuration.
pub const KEY_PAIRS: [KeyPair; 5] = [
    KeyPair { server: 23019, client: 32037 },
    KeyPair { server: 32037, client: 29295 },
    KeyPair { server: 18789, client: 13603 },
    KeyPair { server: 16443, client: 29533 },
    KeyPair { server: 18189, client: 21952 },
];

/// Server/client offset pair applied on top of the username hash.
#[derive(Debug, Copy, Clone)]
pub struct KeyPair {
    pub server: u16,
    pub client: u16,
}

/// Looks up the offset pair for a client-supplied key id.
pub fn key_pair(key: &str) -> ProtocolResult<KeyPair> {
    if key.is_empty() || !key.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ProtocolError::Syntax);
    }

    // A digit run too long for the machine integer is necessarily out of range
    match key.parse::<usize>() {
        Ok(id) if id < KEY_PAIRS.len() => Ok(KEY_PAIRS[id]),
        _ => Err(ProtocolError::KeyOutOfRange),
    }
}

/// Hashes a username over its raw bytes.
#[inline]
pub fn username_hash(username: &str) -> u16 {
    let sum: u32 = username.bytes().map(u32::from).sum();

    ((sum * 1000) % 65536) as u16
}

/// Derives a wire hash from the username hash and a key offset.
#[inline]
pub fn offset_hash(username_hash: u16, offset: u16) -> u16 {
    ((u32::from(username_hash) + u32::from(offset)) % 65536) as u16
}

/// Validates the client confirmation against the expected hash.
pub fn verify_confirmation(confirmation: &str, username_hash: u16, offset: u16) -> ProtocolResult<()> {
    if confirmation.is_empty()
        || confirmation.len() > CONFIRMATION_MAX
        || !confirmation.bytes().all(|byte| byte.is_ascii_digit())
    {
        return Err(ProtocolError::Syntax);
    }

    let expected = u32::from(offset_hash(username_hash, offset));

    match confirmation.parse::<u32>() {
        Ok(value) if value == expected => Ok(()),
        _ => Err(ProtocolError::LoginFailed),
    }
}
