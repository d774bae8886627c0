/*
 * Responsibility
 * - 公開 ID (Post.id) ↔ 内部 ID (i64) の変換 (encode/decode)
 * - 方式 (sqids) をここに閉じ込める。handler / extractor はこの service だけを使う
 *
 * thiserror を使わない理由:
 * - このモジュール内で完結するエラー型なので
 */
use sqids::{Error as SqidsError, Sqids};
use std::{error::Error, fmt};

pub type Result<T> = std::result::Result<T, IdCodecError>;

#[derive(Debug)]
pub enum IdCodecError {
    InvalidMinLength { value: usize },
    Sqids(SqidsError),
    NegativeId { value: i64 },
    // not produced by this codec: wrong alphabet, several numbers, non-canonical form
    Unrecognized,
}

impl fmt::Display for IdCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdCodecError::InvalidMinLength { value } => {
                write!(
                    f,
                    "SQIDS_MIN_LENGTH must be between 0 and 255, got {}",
                    value
                )
            }
            IdCodecError::Sqids(e) => write!(f, "Sqids error: {}", e),
            IdCodecError::NegativeId { value } => {
                write!(f, "id must be non-negative, got {}", value)
            }
            IdCodecError::Unrecognized => write!(f, "unrecognized public id"),
        }
    }
}

impl Error for IdCodecError {}

impl From<SqidsError> for IdCodecError {
    fn from(e: SqidsError) -> Self {
        IdCodecError::Sqids(e)
    }
}

#[derive(Clone, Debug)]
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: usize, alphabet: &str) -> Result<Self> {
        let min_length: u8 = min_length
            .try_into()
            .map_err(|_| IdCodecError::InvalidMinLength { value: min_length })?;

        let sqids = Sqids::builder()
            .min_length(min_length)
            .alphabet(alphabet.chars().collect())
            .build()
            .map_err(IdCodecError::from)?;

        Ok(Self { sqids })
    }

    pub fn encode(&self, id: i64) -> Result<String> {
        let n = u64::try_from(id).map_err(|_| IdCodecError::NegativeId { value: id })?;
        self.sqids.encode(&[n]).map_err(IdCodecError::from)
    }

    pub fn decode(&self, public_id: &str) -> Result<i64> {
        let [n] = self.sqids.decode(public_id)[..] else {
            return Err(IdCodecError::Unrecognized);
        };
        let id = i64::try_from(n).map_err(|_| IdCodecError::Unrecognized)?;

        // Several strings can decode to the same number; only accept the one
        // we hand out, so a post has exactly one public id.
        if self.encode(id)? != public_id {
            return Err(IdCodecError::Unrecognized);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    fn codec() -> IdCodec {
        IdCodec::new(10, ALPHABET).unwrap()
    }

    #[test]
    fn public_ids_are_opaque_and_padded() {
        let public = codec().encode(1).unwrap();

        assert!(public.len() >= 10);
        assert_ne!(public, "1");
        assert_eq!(codec().decode(&public).unwrap(), 1);
    }

    #[test]
    fn rejects_negative_ids() {
        assert!(matches!(
            codec().encode(-5),
            Err(IdCodecError::NegativeId { value: -5 })
        ));
    }

    #[test]
    fn rejects_strings_it_did_not_issue() {
        assert!(matches!(
            codec().decode("!!not-an-id!!"),
            Err(IdCodecError::Unrecognized)
        ));
        assert!(matches!(codec().decode(""), Err(IdCodecError::Unrecognized)));
    }

    #[test]
    fn rejects_min_length_above_u8() {
        assert!(matches!(
            IdCodec::new(300, ALPHABET),
            Err(IdCodecError::InvalidMinLength { value: 300 })
        ));
    }
}
