//! Chunk stream type and newline-delimited JSON decoding

use crate::{
    error::{Error, Result},
    types::GenerateResponse,
};
use std::pin::Pin;
use tokio_stream::Stream;

/// A stream of reply text fragments.
///
/// `None` means the server finished the reply; an `Err` item ends the
/// stream early and no further items follow it.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Reassembles newline-delimited JSON lines from arbitrary byte chunks.
///
/// Network reads do not respect line boundaries, so a partial line is kept
/// until the rest of it arrives.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    pending: Vec<u8>,
}

impl NdjsonDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the outcome of every line completed by them.
    ///
    /// A line carrying a server error becomes an `Err` item.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<String>> {
        self.pending.extend_from_slice(bytes);

        let mut fragments = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(item) = decode_line(&line) {
                fragments.push(item);
            }
        }
        fragments
    }

    /// Flush a final line that was not newline-terminated
    pub fn finish(&mut self) -> Option<Result<String>> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

/// Parse one line, returning its non-empty text fragment or its error.
///
/// Lines that fail to parse are skipped rather than failing the reply.
fn decode_line(line: &[u8]) -> Option<Result<String>> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    tracing::trace!("Processing generate chunk: {}", line);

    match serde_json::from_str::<GenerateResponse>(line) {
        Ok(GenerateResponse {
            error: Some(message),
            ..
        }) => {
            tracing::warn!("Server reported an error mid-reply: {}", message);
            Some(Err(Error::Server(message)))
        }
        Ok(response) => {
            let text = response.text();
            if text.is_empty() {
                None
            } else {
                tracing::trace!("Extracted text chunk: {:?}", text);
                Some(Ok(text.to_string()))
            }
        }
        Err(e) => {
            tracing::warn!("Failed to parse generate chunk: {} - Error: {}", line, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: Vec<Result<String>>) -> Vec<String> {
        items.into_iter().map(|item| item.unwrap()).collect()
    }

    #[test]
    fn test_whole_lines() {
        let mut decoder = NdjsonDecoder::new();
        let out = decoder.push(
            b"{\"model\":\"m\",\"response\":\"Hi \",\"done\":false}\n\
              {\"model\":\"m\",\"response\":\"there\",\"done\":false}\n",
        );
        assert_eq!(texts(out), vec!["Hi ".to_string(), "there".to_string()]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(b"{\"response\":\"Cover").is_empty());
        assert!(decoder.push(b" drive\",\"do").is_empty());
        let out = decoder.push(b"ne\":false}\n");
        assert_eq!(texts(out), vec!["Cover drive".to_string()]);
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let line = "{\"response\":\"caf\u{e9}\"}\n".as_bytes();
        let split = line.len() - 4;
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(texts(decoder.push(&line[split..])), vec!["caf\u{e9}".to_string()]);
    }

    #[test]
    fn test_empty_and_terminal_lines_filtered() {
        let mut decoder = NdjsonDecoder::new();
        let out = decoder.push(b"\n{\"response\":\"\",\"done\":true}\n{\"done\":true}\n");
        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_line_skipped() {
        let mut decoder = NdjsonDecoder::new();
        let out = decoder.push(b"not json\n{\"response\":\"ok\"}\n");
        assert_eq!(texts(out), vec!["ok".to_string()]);
    }

    #[test]
    fn test_error_line_becomes_err() {
        let mut decoder = NdjsonDecoder::new();
        let mut out = decoder.push(
            b"{\"response\":\"Keep \"}\n{\"error\":\"model runner has unexpectedly stopped\"}\n",
        );
        assert_eq!(out.len(), 2);
        let err = out.pop().unwrap().unwrap_err();
        assert!(matches!(err, Error::Server(ref m) if m.contains("unexpectedly stopped")));
        assert_eq!(out.pop().unwrap().unwrap(), "Keep ");
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(b"{\"response\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish().unwrap().unwrap(), "tail");
        assert!(decoder.finish().is_none());
    }
}
