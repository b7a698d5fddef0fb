use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Uppercase letters and digits without the look-alikes I, O, 0 and 1.
pub const TOKEN_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GROUPS: usize = 3;
const GROUP_LEN: usize = 4;
const TOKEN_LEN: usize = GROUPS * GROUP_LEN + (GROUPS - 1);

/// Human-shareable key for the public status page, e.g. `7KQM-X2PD-HT9A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusToken(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenFormatError {
    #[error("status token must be {TOKEN_LEN} characters long")]
    Length,
    #[error("status token groups must be separated by '-'")]
    Separator,
    #[error("status token contains invalid character '{0}'")]
    Character(char),
}

impl StatusToken {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut token = String::with_capacity(TOKEN_LEN);
        for group in 0..GROUPS {
            if group > 0 {
                token.push('-');
            }
            for _ in 0..GROUP_LEN {
                let index = rng.gen_range(0..TOKEN_ALPHABET.len());
                token.push(char::from(TOKEN_ALPHABET[index]));
            }
        }
        Self(token)
    }

    /// Accepts manual entry: surrounding whitespace and lowercase letters are tolerated.
    pub fn parse(raw: &str) -> Result<Self, TokenFormatError> {
        let candidate = raw.trim().to_ascii_uppercase();
        if candidate.len() != TOKEN_LEN {
            return Err(TokenFormatError::Length);
        }

        for (position, ch) in candidate.chars().enumerate() {
            if position % (GROUP_LEN + 1) == GROUP_LEN {
                if ch != '-' {
                    return Err(TokenFormatError::Separator);
                }
            } else if !ch.is_ascii() || !TOKEN_ALPHABET.contains(&(ch as u8)) {
                return Err(TokenFormatError::Character(ch));
            }
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
