//! Bounded report buffer shared by every report renderer.
//!
//! Reports are written into a caller-supplied byte buffer of arbitrary
//! capacity. The contract, for a buffer of capacity `n`:
//!
//! - no write ever touches index `>= n`;
//! - when `n >= 1` the output is NUL-terminated inside the buffer and the
//!   returned length is at most `n - 1`;
//! - when `n == 0` nothing is written and the returned length is 0.
//!
//! Truncation is silent: once the buffer is full, further writes are
//! discarded rather than reported as errors, so a renderer can always run to
//! completion regardless of capacity.

use std::fmt;

/// A `fmt::Write` adapter over a caller-supplied byte buffer.
///
/// One byte of the buffer is reserved for the NUL terminator written by
/// [`ReportBuf::finish`]. Output is UTF-8; a write that would split a
/// multi-byte character at the capacity boundary drops the partial character.
#[derive(Debug)]
pub struct ReportBuf<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> ReportBuf<'a> {
    /// Wraps a destination buffer.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    /// Bytes still available for text (excludes the reserved terminator).
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(1).saturating_sub(self.written)
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Returns `true` once the buffer can accept no more text.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// NUL-terminates the output and returns the byte length written.
    ///
    /// A zero-capacity buffer is left untouched and yields 0.
    #[must_use]
    pub fn finish(self) -> usize {
        if self.buf.is_empty() {
            return 0;
        }
        self.buf[self.written] = 0;
        self.written
    }
}

impl fmt::Write for ReportBuf<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let avail = self.remaining();
        let take = if s.len() <= avail {
            s.len()
        } else {
            // Back off to a char boundary so the buffer stays valid UTF-8.
            let mut end = avail;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            end
        };
        self.buf[self.written..self.written + take].copy_from_slice(&s.as_bytes()[..take]);
        self.written += take;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn zero_capacity_writes_nothing() {
        let mut buf: [u8; 0] = [];
        let mut out = ReportBuf::new(&mut buf);
        let _ = write!(out, "hello");
        assert_eq!(out.finish(), 0);
    }

    #[test]
    fn capacity_one_holds_only_terminator() {
        let mut buf = [0xAA_u8; 1];
        let mut out = ReportBuf::new(&mut buf);
        let _ = write!(out, "hello");
        assert_eq!(out.finish(), 0);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn fits_exactly_with_terminator() {
        let mut buf = [0xAA_u8; 6];
        let mut out = ReportBuf::new(&mut buf);
        let _ = write!(out, "hello");
        assert_eq!(out.finish(), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(buf[5], 0);
    }

    #[test]
    fn truncates_silently() {
        let mut buf = [0xAA_u8; 4];
        let mut out = ReportBuf::new(&mut buf);
        let _ = write!(out, "hello world");
        let _ = write!(out, " and more");
        assert_eq!(out.finish(), 3);
        assert_eq!(&buf[..3], b"hel");
        assert_eq!(buf[3], 0);
    }

    #[test]
    fn multibyte_char_not_split() {
        let mut buf = [0xAA_u8; 4];
        let mut out = ReportBuf::new(&mut buf);
        // "aé" is 1 + 2 bytes; a third write of 'é' would split at capacity 3.
        let _ = write!(out, "aéé");
        let n = out.finish();
        assert_eq!(n, 3);
        assert!(std::str::from_utf8(&buf[..n]).is_ok());
    }

    proptest! {
        #[test]
        fn never_writes_past_capacity(cap in 0usize..64, parts in prop::collection::vec(".{0,16}", 0..8)) {
            let mut buf = vec![0xAA_u8; cap + 8];
            let (dest, _) = buf.split_at_mut(cap);
            let mut out = ReportBuf::new(dest);
            for p in &parts {
                let _ = write!(out, "{p}");
            }
            let n = out.finish();
            if cap == 0 {
                prop_assert_eq!(n, 0);
            } else {
                prop_assert!(n <= cap - 1);
                prop_assert_eq!(buf[n], 0);
            }
            // The guard region past the declared capacity is untouched.
            prop_assert!(buf[cap..].iter().all(|&b| b == 0xAA));
        }

        #[test]
        fn output_is_valid_utf8(cap in 1usize..32, text in "\\PC{0,64}") {
            let mut buf = vec![0u8; cap];
            let mut out = ReportBuf::new(&mut buf);
            let _ = write!(out, "{text}");
            let n = out.finish();
            prop_assert!(std::str::from_utf8(&buf[..n]).is_ok());
        }
    }
}
