//! Incremental UTF-8 decoding.
//!
//! Network chunks split text at arbitrary byte offsets, so a multi-byte
//! character can straddle two chunks. `Utf8Decoder` emits every complete
//! character it has seen and holds back an incomplete tail (at most three
//! bytes) until the rest arrives.
//!
//! An invalid sequence is fatal, but the text before it is still returned.
//! The error then surfaces through `failure()` and on every later call.

use super::reconciler::StreamError;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    /// Bytes consumed so far, for error offsets.
    consumed: usize,
    failed: Option<StreamError>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The invalid sequence that stopped decoding, if any.
    pub fn failure(&self) -> Option<&StreamError> {
        self.failed.as_ref()
    }

    /// Decodes `chunk`, returning all text that is complete so far.
    ///
    /// Once an invalid sequence has been seen this only returns that error.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, StreamError> {
        if let Some(e) = &self.failed {
            return Err(e.clone());
        }

        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);
        let start = self.consumed;

        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                self.consumed += bytes.len();
                Ok(text.to_owned())
            }
            Err(e) => {
                let valid = e.valid_up_to();
                let tail = bytes.split_off(valid);
                self.consumed += valid;
                if e.error_len().is_some() {
                    self.failed = Some(StreamError::Decode {
                        offset: start + valid,
                    });
                } else {
                    // Incomplete sequence at the end: keep it for the next chunk.
                    self.pending = tail;
                }
                // `bytes` now holds only the validated prefix.
                String::from_utf8(bytes).map_err(|e| StreamError::Decode {
                    offset: start + e.utf8_error().valid_up_to(),
                })
            }
        }
    }

    /// Ends decoding. Fails if the stream stopped in the middle of a character.
    pub fn finish(&mut self) -> Result<String, StreamError> {
        if let Some(e) = &self.failed {
            return Err(e.clone());
        }
        if self.pending.is_empty() {
            return Ok(String::new());
        }
        let pending = self.pending.len();
        self.pending.clear();
        Err(StreamError::TruncatedCharacter { pending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"Hello").unwrap(), "Hello");
        assert_eq!(d.pending_len(), 0);
        assert_eq!(d.finish().unwrap(), "");
    }

    #[test]
    fn test_two_byte_char_split() {
        // "é" = C3 A9
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"caf\xC3").unwrap(), "caf");
        assert_eq!(d.pending_len(), 1);
        assert_eq!(d.decode(b"\xA9!").unwrap(), "é!");
        assert_eq!(d.finish().unwrap(), "");
    }

    #[test]
    fn test_four_byte_char_split_across_three_chunks() {
        // "🦀" = F0 9F A6 80
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"\xF0").unwrap(), "");
        assert_eq!(d.decode(b"\x9F\xA6").unwrap(), "");
        assert_eq!(d.pending_len(), 3);
        assert_eq!(d.decode(b"\x80 rust").unwrap(), "🦀 rust");
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"").unwrap(), "");
    }

    #[test]
    fn test_invalid_byte_returns_prefix_then_fails() {
        let mut d = Utf8Decoder::new();
        d.decode(b"ab").unwrap();
        assert_eq!(d.decode(b"c\xFFd").unwrap(), "c");
        assert_eq!(d.failure(), Some(&StreamError::Decode { offset: 3 }));

        // Nothing after the invalid byte is ever decoded.
        assert_eq!(d.decode(b"more"), Err(StreamError::Decode { offset: 3 }));
        assert_eq!(d.finish(), Err(StreamError::Decode { offset: 3 }));
    }

    #[test]
    fn test_invalid_byte_after_split_character() {
        // "é" = C3 A9, then an invalid continuation-less lead byte
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"x\xC3").unwrap(), "x");
        assert_eq!(d.decode(b"\xA9\xC0\x80").unwrap(), "é");
        assert_eq!(d.failure(), Some(&StreamError::Decode { offset: 3 }));
    }

    #[test]
    fn test_invalid_first_byte_has_empty_prefix() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"\xFF").unwrap(), "");
        assert_eq!(d.failure(), Some(&StreamError::Decode { offset: 0 }));
    }

    #[test]
    fn test_truncated_tail_fails_on_finish() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"ok\xE2\x82").unwrap(), "ok");
        assert_eq!(
            d.finish(),
            Err(StreamError::TruncatedCharacter { pending: 2 })
        );
    }
}
