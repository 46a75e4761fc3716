//! Room codes and invite tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::core::rng::GameRng;

/// Unambiguous characters only: no `0/O`, `1/I`.
pub const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 6;

/// Short human-typeable room identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCode(String);

impl RoomCode {
    /// Draw a fresh code.
    pub fn generate(rng: &mut GameRng) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_CHARS[rng.gen_range_usize(0..ROOM_CODE_CHARS.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalize user input (trim, upper-case). `None` if empty.
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim().to_uppercase();
        (!code.is_empty()).then_some(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL-safe token for sharing the code in a link.
    ///
    /// ```
    /// use uno_sync::lobby::RoomCode;
    ///
    /// let code = RoomCode::parse("abc234").unwrap();
    /// let token = code.invite_token();
    /// assert_eq!(RoomCode::from_invite(&token), Some(code));
    /// ```
    pub fn invite_token(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }

    /// Decode an invite token. `None` on anything malformed.
    pub fn from_invite(token: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim().trim_end_matches('=')).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        Self::parse(&text)
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
