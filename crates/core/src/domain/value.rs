// Text Value - owned bytes held by a node

use std::borrow::Cow;
use std::collections::TryReserveError;

/// Sentinel byte that ends a text value
pub const TERMINATOR: u8 = 0;

/// Owned copy of a text value
///
/// Values are opaque bytes; the terminator is implied and never stored.
#[derive(PartialEq, Eq, Hash)]
pub struct TextValue(Box<[u8]>);

impl TextValue {
    /// The part of `text` that precedes its first terminator (all of it if none)
    pub fn significant(text: &[u8]) -> &[u8] {
        match text.iter().position(|&b| b == TERMINATOR) {
            Some(end) => &text[..end],
            None => text,
        }
    }

    /// Clone `text` into freshly reserved storage
    ///
    /// The caller is expected to pass already-significant bytes.
    pub(crate) fn try_clone_from(text: &[u8]) -> Result<Self, TryReserveError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(text.len())?;
        bytes.extend_from_slice(text);
        Ok(Self(bytes.into_boxed_slice()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_vec()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Copy the value into `buf`, truncated to fit
    ///
    /// Writes at most `buf.len() - 1` value bytes followed by the terminator,
    /// so `buf` always holds a terminated value. Truncation is silent. An
    /// empty buffer is left untouched.
    ///
    /// # Returns
    /// Number of value bytes written, terminator excluded
    pub fn copy_truncated(&self, buf: &mut [u8]) -> usize {
        let Some(room) = buf.len().checked_sub(1) else {
            return 0;
        };

        let written = self.0.len().min(room);
        buf[..written].copy_from_slice(&self.0[..written]);
        buf[written] = TERMINATOR;
        written
    }
}

impl AsRef<[u8]> for TextValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for TextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl std::fmt::Display for TextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
