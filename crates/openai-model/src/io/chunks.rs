#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// Reading the response body failed, usually a dropped connection.
#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub String);

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error(format!("timed out reading the response: {err}"))
        } else {
            Error(err.to_string())
        }
    }
}

enum Source {
    Body(Response),
    #[cfg(test)]
    Fixture(VecDeque<Bytes>),
}

/// The body of a streamed response, read chunk by chunk as it arrives.
pub struct Chunks {
    source: Source,
}

impl Chunks {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        Self {
            source: Source::Body(response),
        }
    }

    /// Replays canned chunks, one per read.
    #[cfg(test)]
    pub fn from_vec_deque(chunks: VecDeque<Bytes>) -> Self {
        Self {
            source: Source::Fixture(chunks),
        }
    }

    /// Returns the next chunk, or `None` once the body is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match &mut self.source {
            Source::Body(response) => Ok(response.chunk().await?),
            #[cfg(test)]
            Source::Fixture(chunks) => Ok(chunks.pop_front()),
        }
    }
}
