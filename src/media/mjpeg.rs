use crate::error::StreamError;

pub const DEFAULT_BOUNDARY: &str = "frame";

// A single frame well above any sane JPEG size.
const MAX_BUFFERED_BYTES: usize = 16 * 1024 * 1024;
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Extracts the part boundary from a `multipart/x-mixed-replace` content type.
pub fn boundary_from_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("boundary")
                .then(|| value.trim().trim_matches('"').trim_start_matches("--").to_string())
        })
        .filter(|boundary| !boundary.is_empty())
        .unwrap_or_else(|| DEFAULT_BOUNDARY.to_string())
}

/// Incremental splitter for `multipart/x-mixed-replace` bodies.
///
/// Chunks can be split anywhere; bytes of an incomplete part stay buffered
/// until the rest arrives. A part ends either after its `Content-Length` or at
/// the next delimiter. Call [`MjpegDecoder::finish`] at end of stream to
/// release a final part that no delimiter will ever close.
pub struct MjpegDecoder {
    delimiter: Vec<u8>,
    buffer: Vec<u8>,
}

impl MjpegDecoder {
    pub fn new(boundary: &str) -> Self {
        Self {
            delimiter: format!("--{}", boundary).into_bytes(),
            buffer: Vec::new(),
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds a chunk and returns the bodies of every part it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>, StreamError> {
        self.buffer.extend_from_slice(chunk);

        let mut parts = Vec::new();
        loop {
            match self.next_part() {
                Ok(Some(part)) => {
                    if !part.is_empty() {
                        parts.push(part);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e);
                }
            }
        }

        if self.buffer.len() > MAX_BUFFERED_BYTES {
            let size = self.buffer.len();
            self.buffer.clear();
            return Err(StreamError::Overflow(size));
        }
        Ok(parts)
    }

    /// Releases the part still buffered at end of stream, if its headers
    /// arrived in full. A part shorter than its `Content-Length` is dropped.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let buffer = std::mem::take(&mut self.buffer);
        let start = find(&buffer, &self.delimiter)?;
        let (body_start, length) = self.part_layout(&buffer[start..]).ok()??;
        let body = &buffer[start + body_start..];

        let body = match length {
            Some(length) => body.get(..length)?,
            None => trim_trailing_crlf(body),
        };
        (!body.is_empty()).then(|| body.to_vec())
    }

    fn next_part(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        let Some(start) = find(&self.buffer, &self.delimiter) else {
            // Keep a tail that might be the beginning of a delimiter.
            let keep = self.delimiter.len().saturating_sub(1);
            if self.buffer.len() > keep {
                self.buffer.drain(..self.buffer.len() - keep);
            }
            return Ok(None);
        };
        if start > 0 {
            self.buffer.drain(..start);
        }

        let Some((body_start, length)) = self.part_layout(&self.buffer)? else {
            return Ok(None);
        };

        let body_end = match length {
            Some(length) => {
                let body_end = body_start
                    .checked_add(length)
                    .ok_or(StreamError::Overflow(length))?;
                if self.buffer.len() < body_end {
                    return Ok(None);
                }
                body_end
            }
            None => match find(&self.buffer[body_start..], &self.delimiter) {
                Some(offset) => body_start + offset,
                None => return Ok(None),
            },
        };

        let body = trim_trailing_crlf(&self.buffer[body_start..body_end]).to_vec();
        self.buffer.drain(..body_end);
        Ok(Some(body))
    }

    /// For bytes starting at a delimiter, returns where the body starts and the
    /// declared `Content-Length`, once the headers are complete. A declared
    /// length above the buffer cap is rejected.
    fn part_layout(&self, part: &[u8]) -> Result<Option<(usize, Option<usize>)>, StreamError> {
        let headers_start = self.delimiter.len();
        let Some(headers_len) = part.get(headers_start..).and_then(|rest| find(rest, HEADER_END))
        else {
            return Ok(None);
        };
        let headers_end = headers_start + headers_len;
        let length = content_length(&part[headers_start..headers_end]);
        if let Some(length) = length {
            if length > MAX_BUFFERED_BYTES {
                return Err(StreamError::Overflow(length));
            }
        }
        Ok(Some((headers_end + HEADER_END.len(), length)))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn content_length(headers: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(headers).lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn trim_trailing_crlf(body: &[u8]) -> &[u8] {
    body.strip_suffix(b"\r\n").unwrap_or(body)
}
