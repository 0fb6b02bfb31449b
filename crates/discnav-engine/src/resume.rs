//! Resume record text form.

use discnav_common::{Error, PlaylistId, Result};
use serde::Deserialize;
use serde_json::json;

const VERSION: u32 = 1;

/// Minimal state needed to resume playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeState {
    pub playlist_id: PlaylistId,
}

#[derive(Deserialize)]
struct Record {
    version: u32,
    playlist_id: u32,
}

/// Converts [`ResumeState`] to and from `{"version":1,"playlist_id":N}`.
pub struct ResumeStateCodec;

impl ResumeStateCodec {
    pub fn encode(state: &ResumeState) -> String {
        json!({
            "version": VERSION,
            "playlist_id": state.playlist_id.0,
        })
        .to_string()
    }

    pub fn decode(text: &str) -> Result<ResumeState> {
        let record: Record =
            serde_json::from_str(text.trim()).map_err(|e| Error::malformed_resume(e.to_string()))?;
        if record.version != VERSION {
            return Err(Error::malformed_resume(format!(
                "unsupported version {}",
                record.version
            )));
        }
        Ok(ResumeState {
            playlist_id: PlaylistId(record.playlist_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_encode_format() {
        let text = ResumeStateCodec::encode(&ResumeState {
            playlist_id: PlaylistId(800),
        });
        assert_eq!(text, r#"{"playlist_id":800,"version":1}"#);
        assert_eq!(
            ResumeStateCodec::decode(&text).unwrap().playlist_id,
            PlaylistId(800)
        );
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        for text in [
            "",
            "800",
            "{\"playlist_id\":800}",
            "{\"version\":1,\"playlist_id\":-1}",
            "{\"version\":2,\"playlist_id\":800}",
        ] {
            assert_matches!(
                ResumeStateCodec::decode(text),
                Err(Error::MalformedResume(_)),
                "{text}"
            );
        }
    }
}
