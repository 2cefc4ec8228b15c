//! Server-sent event framing
//!
//! The transport hands over text chunks with no alignment to logical frames.
//! [`FrameDecoder`] buffers them and only releases a frame once its blank-line
//! terminator has arrived; whatever follows the last terminator is carried over
//! to the next chunk.

/// One complete, not yet interpreted, server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// All `data:` lines joined with `\n`
    pub data: String,
    /// Value of the `id:` field, if any
    pub id: Option<String>,
}

impl RawFrame {
    /// Whether the frame carries neither a label nor a payload
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty()
    }
}

/// Incremental splitter from text chunks to [`RawFrame`]s
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

const TERMINATOR: &str = "\n\n";

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every frame it completes
    pub fn push(&mut self, chunk: &str) -> Vec<RawFrame> {
        self.buffer.push_str(chunk);
        // A lone trailing '\r' stays put until its '\n' shows up in the next chunk.
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.find(TERMINATOR) {
            let block: String = self.buffer.drain(..end + TERMINATOR.len()).collect();
            let frame = parse_block(&block[..end]);
            if !frame.is_empty() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Bytes buffered but not yet terminated
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Drop and return the unterminated tail once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

fn parse_block(block: &str) -> RawFrame {
    let mut frame = RawFrame::default();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in block.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field.trim() {
            "event" => frame.event = Some(value.trim().to_string()),
            "data" => data_lines.push(value),
            "id" => frame.id = Some(value.to_string()),
            _ => {}
        }
    }

    frame.data = data_lines.join("\n");
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push("event: delta\ndata: \"Hello\"\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("delta"));
        assert_eq!(frames[0].data, "\"Hello\"");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_partial_frame_is_carried_over() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push("data: {\"event\":\"del").is_empty());
        assert!(decoder.push("ta\",\"data\":\"Hi\"}\n").is_empty());
        let frames = decoder.push("\ndata: {\"ev");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"event\":\"delta\",\"data\":\"Hi\"}");
        assert_eq!(decoder.pending(), "data: {\"ev");
    }

    #[test]
    fn test_many_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push("data: 1\n\ndata: 2\n\ndata: 3\n\n");
        let data: Vec<&str> = frames.iter().map(|f| f.data.as_str()).collect();
        assert_eq!(data, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push("event: end\r\ndata: \r").is_empty());
        let frames = decoder.push("\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("end"));
        assert_eq!(frames[0].data, "");
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(": keep-alive\nid: 7\ndata: line one\ndata: line two\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "line one\nline two");
        assert_eq!(frames[0].id.as_deref(), Some("7"));
        assert!(frames[0].event.is_none());
    }

    #[test]
    fn test_comment_only_block_is_skipped() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(": ping\n\n").is_empty());
    }

    #[test]
    fn test_byte_by_byte_matches_whole_input() {
        let input = "event: delta\ndata: \"a\"\n\nevent: tool_call\ndata: {\"name\":\"x\"}\n\n";
        let whole = FrameDecoder::new().push(input);

        let mut decoder = FrameDecoder::new();
        let mut pieces = Vec::new();
        for ch in input.chars() {
            pieces.extend(decoder.push(&ch.to_string()));
        }
        assert_eq!(pieces, whole);
    }

    #[test]
    fn test_finish_returns_unterminated_tail() {
        let mut decoder = FrameDecoder::new();
        decoder.push("data: done\n\ndata: partial");
        assert_eq!(decoder.finish().as_deref(), Some("data: partial"));
        assert!(decoder.finish().is_none());
    }
}
