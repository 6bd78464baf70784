use std::fmt;

/// Largest response body accepted, terminator included.
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendError {
    /// The chunk would take the body to the size limit; nothing was appended.
    TooLarge,
    OutOfMemory,
}

impl fmt::Display for AppendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendError::TooLarge => write!(f, "response data is too large"),
            AppendError::OutOfMemory => write!(f, "not enough memory"),
        }
    }
}

/// Accumulates a response body, keeping it NUL-terminated and below `max_size` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBuffer {
    // Always ends with a single NUL.
    data: Vec<u8>,
    max_size: usize,
    truncated: bool,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        ResponseBuffer::new(MAX_BUFFER_SIZE)
    }
}

impl ResponseBuffer {
    pub fn new(max_size: usize) -> ResponseBuffer {
        ResponseBuffer {
            data: vec![0],
            max_size,
            truncated: false,
        }
    }

    /// Appends `chunk`, or rejects it whole once the cumulative size would reach the limit.
    ///
    /// A rejected chunk marks the buffer truncated.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), AppendError> {
        if self.len() + chunk.len() >= self.max_size {
            self.truncated = true;
            return Err(AppendError::TooLarge);
        }

        if self.data.try_reserve(chunk.len()).is_err() {
            return Err(AppendError::OutOfMemory);
        }

        self.data.pop();
        self.data.extend_from_slice(chunk);
        self.data.push(0);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// True when the transfer was aborted because the body hit the size limit.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.data.pop();
        self.data
    }
}
