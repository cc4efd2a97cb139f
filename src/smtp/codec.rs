/// Streaming decoder for the DATA payload.
///
/// Runs a tiny byte state machine over the wire bytes: removes the leading
/// dot of stuffed lines, recognizes the `<CRLF>.<CRLF>` terminator (and the
/// tolerant `<LF>.<LF>` form) and never holds more state than a few bytes,
/// whatever the message size. The CRLF preceding the terminating dot is part
/// of the payload; only the dot and its line ending are stripped.
///
/// Input may arrive in arbitrary chunks; state carries over between calls.
#[derive(Debug)]
pub struct DataCodec {
    state: DotState,
    done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DotState {
    /// At the start of a line, right after LF (or at the very beginning)
    LineStart,
    /// Seen a dot at line start, held back pending the next byte
    Dot,
    /// Seen dot + CR at line start, terminator if LF follows
    DotCr,
    /// Anywhere else
    MidLine,
}

impl Default for DataCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCodec {
    pub fn new() -> Self {
        DataCodec {
            state: DotState::LineStart,
            done: false,
        }
    }

    /// Ready for the next message.
    pub fn reset(&mut self) {
        self.state = DotState::LineStart;
        self.done = false;
    }

    /// True once the terminator has been consumed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decodes as much of `input` as possible, appending payload bytes to
    /// `out`. Returns the number of input bytes consumed; consumption stops
    /// right behind the terminator so pipelined commands stay in the buffer.
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) -> usize {
        use DotState as S;
        let mut consumed = 0;
        for &b in input {
            if self.done {
                break;
            }
            consumed += 1;
            self.state = match (self.state, b) {
                (S::LineStart, b'.') => S::Dot,
                (S::LineStart, b'\n') => {
                    out.push(b);
                    S::LineStart
                }
                (S::LineStart, c) => {
                    out.push(c);
                    S::MidLine
                }
                (S::Dot, b'\r') => S::DotCr,
                (S::Dot, b'\n') => {
                    self.done = true;
                    S::LineStart
                }
                // the line starts with a dot and goes on, the dot is dropped
                (S::Dot, c) => {
                    out.push(c);
                    S::MidLine
                }
                (S::DotCr, b'\n') => {
                    self.done = true;
                    S::LineStart
                }
                // false alarm, the held-back CR was payload after all
                (S::DotCr, c) => {
                    out.push(b'\r');
                    out.push(c);
                    if c == b'\n' {
                        S::LineStart
                    } else {
                        S::MidLine
                    }
                }
                (S::MidLine, b'\n') => {
                    out.push(b);
                    S::LineStart
                }
                (S::MidLine, c) => {
                    out.push(c);
                    S::MidLine
                }
            };
        }
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> (Vec<u8>, bool, usize) {
        let mut sut = DataCodec::new();
        let mut out = Vec::new();
        let mut consumed = 0;
        for chunk in chunks {
            consumed += sut.feed(chunk, &mut out);
        }
        (out, sut.is_done(), consumed)
    }

    #[test]
    fn empty_message_terminates_immediately() {
        let (out, done, consumed) = decode_all(&[b".\r\n"]);
        assert_eq!(out, b"");
        assert!(done);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn payload_keeps_the_crlf_before_the_dot() {
        let (out, done, _) = decode_all(&[b"hello\r\n.\r\n"]);
        assert_eq!(out, b"hello\r\n");
        assert!(done);
    }

    #[test]
    fn stuffed_dot_line_is_unstuffed() {
        let (out, done, _) = decode_all(&[b"..\r\nxoxo\r\n.\r\n"]);
        assert_eq!(out, b".\r\nxoxo\r\n");
        assert!(done);
    }

    #[test]
    fn stuffed_terminator_lookalike_does_not_terminate() {
        // a payload of "\r\n.\r\n" arrives stuffed as "\r\n..\r\n"
        let (out, done, _) = decode_all(&[b"\r\n..\r\n.\r\n"]);
        assert_eq!(out, b"\r\n.\r\n");
        assert!(done);
    }

    #[test]
    fn dot_text_line_loses_only_the_first_dot() {
        let (out, done, _) = decode_all(&[b".foo\r\n.\r\n"]);
        assert_eq!(out, b"foo\r\n");
        assert!(done);
    }

    #[test]
    fn lone_lf_terminator_is_tolerated() {
        let (out, done, _) = decode_all(&[b"hi\n.\n"]);
        assert_eq!(out, b"hi\n");
        assert!(done);
    }

    #[test]
    fn dot_cr_without_lf_is_payload() {
        let (out, done, _) = decode_all(&[b".\rx\r\n.\r\n"]);
        assert_eq!(out, b"\rx\r\n");
        assert!(done);
    }

    #[test]
    fn state_carries_across_chunk_boundaries() {
        let (out, done, _) = decode_all(&[b"abc\r", b"\n", b".", b"\r", b"\n"]);
        assert_eq!(out, b"abc\r\n");
        assert!(done);
    }

    #[test]
    fn split_stuffing_across_chunks() {
        let (out, done, _) = decode_all(&[b"\r\n.", b".\r\n", b".\r\n"]);
        assert_eq!(out, b"\r\n.\r\n");
        assert!(done);
    }

    #[test]
    fn consumption_stops_behind_the_terminator() {
        let mut sut = DataCodec::new();
        let mut out = Vec::new();
        let consumed = sut.feed(b"x\r\n.\r\nQUIT\r\n", &mut out);
        assert_eq!(consumed, 6);
        assert!(sut.is_done());
        assert_eq!(out, b"x\r\n");
    }

    #[test]
    fn cr_not_followed_by_lf_stays_midline() {
        let (out, done, _) = decode_all(&[b"a\rb\r\n.\r\n"]);
        assert_eq!(out, b"a\rb\r\n");
        assert!(done);
    }

    #[test]
    fn reset_starts_a_new_message() {
        let mut sut = DataCodec::new();
        let mut out = Vec::new();
        sut.feed(b"one\r\n.\r\n", &mut out);
        assert!(sut.is_done());
        sut.reset();
        out.clear();
        sut.feed(b"two\r\n.\r\n", &mut out);
        assert_eq!(out, b"two\r\n");
        assert!(sut.is_done());
    }
}
