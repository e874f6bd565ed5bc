//! A minimal stdio transport: `Content-Length`-framed reads and writes over
//! stdin/stdout. This is not part of the dispatch core itself — the
//! dispatcher only ever touches [`crate::wire::OutboundQueue`] and a byte
//! slice — it exists purely so the crate ships a runnable binary.

use std::io::{self, BufRead, Read, Write};

/// Reads one `Content-Length`-framed message body from `reader`.
///
/// Returns `Ok(None)` on a clean EOF before any header bytes are read, which
/// a caller should treat as "client hung up" rather than a transport error.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut content_length = None;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            content_length = value.trim().parse::<usize>().ok();
        }
        // Other headers (e.g. Content-Type) are accepted but ignored.
    }

    let Some(len) = content_length else {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length header"));
    };

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Writes one already-serialized JSON-RPC frame to `writer`, adding the
/// `Content-Length` header the LSP transport requires.
pub fn write_message<W: Write>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n", frame.len())?;
    writer.write_all(frame)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_one_framed_message() {
        let input = b"Content-Length: 13\r\n\r\n{\"jsonrpc\":1}".to_vec();
        let mut cursor = Cursor::new(input);
        let body = read_message(&mut cursor).unwrap().unwrap();
        assert_eq!(body, b"{\"jsonrpc\":1}");
    }

    #[test]
    fn ignores_unrelated_headers() {
        let input = b"Content-Type: application/vscode-jsonrpc\r\nContent-Length: 2\r\n\r\n{}".to_vec();
        let mut cursor = Cursor::new(input);
        let body = read_message(&mut cursor).unwrap().unwrap();
        assert_eq!(body, b"{}");
    }

    #[test]
    fn clean_eof_yields_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_message(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn missing_content_length_is_an_error() {
        let mut cursor = Cursor::new(b"\r\n".to_vec());
        assert!(read_message(&mut cursor).is_err());
    }

    #[test]
    fn write_message_adds_content_length_header() {
        let mut buf = Vec::new();
        write_message(&mut buf, b"hello").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Content-Length: 5\r\n\r\nhello"));
    }
}
