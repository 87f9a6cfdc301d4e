use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` payload of each event is surfaced. Comment lines
/// (keep-alives) and the `event`, `id` and `retry` fields are skipped.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            // Not enough buffered data for a whole event, read more. Bytes
            // are kept raw until an event is complete, since a chunk may end
            // in the middle of a multi-byte character.
            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / lf )
        while let Some((end, sep_len)) = find_boundary(&self.buf) {
            let block: Vec<u8> = self.buf.drain(..end + sep_len).collect();
            let Ok(block) = std::str::from_utf8(&block[..end]) else {
                return Err(Error::InvalidPayload);
            };

            let mut data_lines = vec![];
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (field, value) = match line.split_once(':') {
                    Some((field, value)) => {
                        (field, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match field {
                    "data" => data_lines.push(value),
                    "event" | "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            // Blocks made only of comments carry no event, keep looking.
            if !data_lines.is_empty() {
                return Ok(Some(data_lines.join("\n")));
            }
        }
        Ok(None)
    }
}

/// Returns the offset and length of the first blank-line separator.
fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    [lf, crlf].into_iter().flatten().min_by_key(|(idx, _)| *idx)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(chunks: Vec<Bytes>) -> Sse {
        Sse::new(Chunks::from_vec_deque(chunks.into()))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_from(vec![
            Bytes::from_static(b"data: hello\n\n"),
            Bytes::from_static(b"data: bye\n\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let mut sse = sse_from(vec![
            Bytes::from_static(b"data:"),
            Bytes::from_static(b" hello\n"),
            Bytes::from_static(b"\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_comments_and_crlf() {
        let mut sse = sse_from(vec![
            Bytes::from_static(b": keep-alive\n\n"),
            Bytes::from_static(b"event: message\r\ndata: first\r\n\r\n"),
            Bytes::from_static(b"data: line one\ndata: line two\n\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "first");
        assert_eq!(
            sse.next_event().await.unwrap().unwrap(),
            "line one\nline two"
        );
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_multibyte_char() {
        // "é" is 0xC3 0xA9, split across two chunks.
        let mut sse = sse_from(vec![
            Bytes::from_static(b"data: caf\xC3"),
            Bytes::from_static(b"\xA9\n\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "café");
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_from(vec![Bytes::from_static(b"xxxxxx\n\n")]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let mut sse = sse_from(vec![Bytes::from_static(b"xxxxxx\n")]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_from(vec![
            Bytes::from_static(b"data: hello\n"),
            Bytes::from_static(b"data: bye\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
