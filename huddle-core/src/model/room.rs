use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DEFAULT_ROOM_CODE_LEN: usize = 4;

const MAX_ROOM_CODE_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomCodeError {
    #[error("room code is empty")]
    Empty,

    #[error("room code is longer than {MAX_ROOM_CODE_LEN} characters")]
    TooLong,

    #[error("room code may only contain letters A-Z")]
    InvalidCharacter,
}

/// Short uppercase room identifier, e.g. `ABCD`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn generate<R: Rng>(rng: &mut R, len: usize) -> Self {
        let code = (0..len)
            .map(|_| {
                let idx = rng.gen_range(0..ROOM_CODE_ALPHABET.len());
                char::from(ROOM_CODE_ALPHABET[idx])
            })
            .collect();
        Self(code)
    }

    /// Accepts lowercase input; codes are stored uppercase.
    pub fn parse(raw: &str) -> Result<Self, RoomCodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RoomCodeError::Empty);
        }
        if trimmed.len() > MAX_ROOM_CODE_LEN {
            return Err(RoomCodeError::TooLong);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(RoomCodeError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomState {
    Open,
    Closing,
    Closed,
}
