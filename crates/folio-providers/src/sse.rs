//! Minimal server-sent-events line assembly
//!
//! Both chat backends stream SSE over reqwest's byte stream. Network reads
//! split lines arbitrarily, so complete lines are re-assembled here before
//! the `data:` payloads are parsed.

/// Accumulates raw bytes and yields complete `data:` payloads
pub(crate) struct SseLineBuffer {
    buf: String,
}

impl SseLineBuffer {
    pub(crate) fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Feed a network read, returning the payload of every `data:` line
    /// completed by it. Non-data lines (event names, comments, blanks)
    /// are dropped.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.push_str(&String::from_utf8_lossy(bytes));

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim_end();
            if let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) {
                let data = data.trim();
                if !data.is_empty() {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}
