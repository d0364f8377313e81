//! Inbound transport seam.

use std::io::{self, Read};

/// Anything the reader can drain bytes from.
///
/// A read that returns `Ok(0)` or a timeout means "no data yet", not end of
/// stream; serial ports configured with a read timeout behave this way.
pub trait ByteSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read> ByteSource for R {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Whether an I/O error only means "nothing to read right now".
pub fn is_idle_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_errors() {
        assert!(is_idle_error(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(is_idle_error(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(is_idle_error(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(!is_idle_error(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(!is_idle_error(&io::Error::other("usb unplugged")));
    }

    #[test]
    fn test_read_impls_are_sources() -> io::Result<()> {
        let mut source = io::Cursor::new(b"SPD:1\n".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(source.read_bytes(&mut buf)?, 4);
        assert_eq!(&buf, b"SPD:");
        Ok(())
    }
}
