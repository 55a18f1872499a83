//! # Lectura del Request desde el socket
//! src/http/reader.rs
//!
//! Lee una conexión hasta tener un request completo:
//!
//! 1. Lee hasta encontrar `\r\n\r\n`, hasta llenar el buffer o hasta que el
//!    peer cierre.
//! 2. Si los headers declaran `Content-Length`, sigue leyendo hasta tener
//!    `headers + 4 + content_length` bytes, llenar el buffer o que el peer
//!    deje de enviar.
//! 3. Sin `Content-Length` no se hacen más lecturas.
//!
//! Un body más grande que el buffer se trunca sin error.

use super::request::{declared_content_length, find_header_end, ParseError, HEADER_TERMINATOR};
use std::io::{self, Read};
use thiserror::Error;

/// Capacidad por defecto del buffer de entrada
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 65536;

/// Errores del lector
#[derive(Debug, Error)]
pub enum ReadError {
    /// El peer cerró sin enviar nada
    #[error("connection closed before any data arrived")]
    Closed,

    /// Llegaron bytes pero no forman un request
    #[error(transparent)]
    Malformed(#[from] ParseError),

    /// Error de transporte
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// Lee un request completo de `stream` usando un buffer de `capacity` bytes
///
/// Retorna los bytes crudos listos para [`super::Request::parse`].
///
/// # Ejemplo
/// ```
/// use std::io::Cursor;
/// use ternic_server::http::reader::read_request;
///
/// let mut stream = Cursor::new(b"POST /x HTTP/1.1\r\nContent-Length: 2\r\n\r\nok".to_vec());
/// let raw = read_request(&mut stream, 1024).unwrap();
/// assert!(raw.ends_with(b"\r\n\r\nok"));
/// ```
pub fn read_request<R: Read>(stream: &mut R, capacity: usize) -> Result<Vec<u8>, ReadError> {
    let mut buffer = vec![0u8; capacity];
    let mut filled = 0;
    let mut search_from = 0;

    // Fase 1: hasta encontrar el fin de los headers
    let head_end = loop {
        if let Some(pos) = find_header_end(&buffer[search_from..filled]) {
            break search_from + pos;
        }
        // El terminador puede quedar partido entre dos lecturas
        search_from = filled.saturating_sub(HEADER_TERMINATOR.len() - 1);

        if filled == capacity {
            return Err(ParseError::MissingTerminator.into());
        }

        match read_some(stream, &mut buffer[filled..])? {
            0 if filled == 0 => return Err(ReadError::Closed),
            0 => return Err(ParseError::MissingTerminator.into()),
            n => filled += n,
        }
    };

    // Fase 2: completar el body declarado
    if let Some(content_length) = declared_content_length(&buffer[..head_end])? {
        let expected = (head_end + HEADER_TERMINATOR.len())
            .saturating_add(content_length)
            .min(capacity);

        while filled < expected {
            match read_some(stream, &mut buffer[filled..expected])? {
                0 => break,
                n => filled += n,
            }
        }
    }

    buffer.truncate(filled);
    Ok(buffer)
}

/// Una lectura; un timeout cuenta como "el peer dejó de enviar"
fn read_some<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Ok(0)
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Entrega los datos en trozos, como llegarían por TCP
    struct Chunked {
        chunks: VecDeque<Vec<u8>>,
        reads: usize,
    }

    impl Chunked {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                reads: 0,
            }
        }
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let Some(mut chunk) = self.chunks.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.chunks.push_front(chunk.split_off(n));
            }
            Ok(n)
        }
    }

    /// Envía sus datos y luego se queda "colgado" (timeout)
    struct Stalled {
        data: Option<Vec<u8>>,
    }

    impl Read for Stalled {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out")),
            }
        }
    }

    #[test]
    fn test_reads_simple_request() {
        let mut stream = Cursor::new(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n".to_vec());
        let raw = read_request(&mut stream, 1024).unwrap();
        assert_eq!(raw, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
    }

    #[test]
    fn test_terminator_split_across_reads() {
        let mut stream = Chunked::new(&[b"GET / HTTP/1.1\r\nHost: x\r", b"\n\r", b"\n"]);
        let raw = read_request(&mut stream, 1024).unwrap();
        assert!(raw.ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn test_waits_for_declared_body() {
        let mut stream = Chunked::new(&[
            b"POST /submit HTTP/1.1\r\nContent-Length: 10\r\n\r\n",
            b"hello",
            b"world",
        ]);
        let raw = read_request(&mut stream, 1024).unwrap();
        assert!(raw.ends_with(b"\r\n\r\nhelloworld"));
    }

    #[test]
    fn test_no_content_length_reads_nothing_more() {
        let mut stream = Chunked::new(&[b"POST /submit HTTP/1.1\r\n\r\nfirst", b"second"]);
        let raw = read_request(&mut stream, 1024).unwrap();

        assert!(raw.ends_with(b"first"));
        assert_eq!(stream.reads, 1);
    }

    #[test]
    fn test_body_truncated_at_capacity() {
        let mut data = b"POST / HTTP/1.1\r\nContent-Length: 100\r\n\r\n".to_vec();
        let head_len = data.len();
        data.extend(std::iter::repeat(b'a').take(100));

        let mut stream = Cursor::new(data);
        let raw = read_request(&mut stream, head_len + 10).unwrap();
        assert_eq!(raw.len(), head_len + 10);
    }

    #[test]
    fn test_short_body_completes_when_peer_closes() {
        let mut stream = Cursor::new(b"POST / HTTP/1.1\r\nContent-Length: 50\r\n\r\nabc".to_vec());
        let raw = read_request(&mut stream, 1024).unwrap();
        assert!(raw.ends_with(b"abc"));
    }

    #[test]
    fn test_short_body_completes_on_timeout() {
        let mut stream = Stalled {
            data: Some(b"POST / HTTP/1.1\r\nContent-Length: 50\r\n\r\nabc".to_vec()),
        };
        let raw = read_request(&mut stream, 1024).unwrap();
        assert!(raw.ends_with(b"abc"));
    }

    #[test]
    fn test_closed_without_data() {
        let mut stream = Cursor::new(Vec::new());
        assert!(matches!(read_request(&mut stream, 1024), Err(ReadError::Closed)));
    }

    #[test]
    fn test_missing_terminator_is_malformed() {
        let mut stream = Cursor::new(b"GET / HTTP/1.1\r\nHost: x\r\n".to_vec());
        assert!(matches!(
            read_request(&mut stream, 1024),
            Err(ReadError::Malformed(ParseError::MissingTerminator))
        ));
    }

    #[test]
    fn test_buffer_exhausted_without_terminator() {
        let mut stream = Cursor::new(vec![b'a'; 64]);
        assert!(matches!(
            read_request(&mut stream, 32),
            Err(ReadError::Malformed(ParseError::MissingTerminator))
        ));
    }

    #[test]
    fn test_invalid_content_length_is_malformed() {
        let mut stream = Cursor::new(b"POST / HTTP/1.1\r\nContent-Length: nope\r\n\r\n".to_vec());
        assert!(matches!(
            read_request(&mut stream, 1024),
            Err(ReadError::Malformed(ParseError::InvalidContentLength(_)))
        ));
    }
}
