//! Incremental decoder for the upstream NDJSON token stream.
use bytes::BytesMut;
use serde::Deserialize;

// One line of upstream output. The final line of a real session also
// carries completion metadata (`done`, timing counters) which the relay
// never consumes, so unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
}

/// Turns arbitrarily chunked bytes into an ordered sequence of `response`
/// tokens, one per complete NDJSON line.
///
/// Framing happens at the byte level: the buffer is split on `\n` and only
/// complete lines are ever decoded to text, so a chunk boundary that falls
/// inside a multi-byte character or mid-line is carried over to the next
/// `feed` call. A line either parses as JSON with a usable `response` field
/// or it is dropped. Partial or garbled text is never emitted.
#[derive(Default)]
pub struct NdjsonDecoder {
    buf: BytesMut,
    malformed_lines: u64,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk of bytes and return every token completed by it,
    /// in upstream order. The trailing incomplete line stays buffered.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut tokens = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<GenerateChunk>(line) {
                Ok(chunk) => {
                    if let Some(token) = chunk.response {
                        if !token.is_empty() {
                            tokens.push(token);
                        }
                    }
                }
                Err(err) => {
                    self.malformed_lines += 1;
                    tracing::warn!("Skipping malformed upstream line: {}", err);
                }
            }
        }
        tokens
    }

    /// Flush at end of stream. A dangling fragment with no terminating
    /// newline cannot be a complete JSON object, so it is discarded rather
    /// than parsed.
    pub fn finish(&mut self) {
        if !self.buf.is_empty() {
            tracing::debug!(
                "Discarding {} byte trailing fragment at end of stream",
                self.buf.len()
            );
            self.buf.clear();
        }
    }

    /// Number of lines dropped because they failed to parse.
    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }
}
