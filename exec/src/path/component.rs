use bstr::ByteSlice;
use std::fmt::{self, Debug, Display};

use crate::Error;

/// A single validated name inside a mapping [Path](super::Path).
/// Internally uses a [bytes::Bytes], but disallows slashes and null
/// bytes, as well as '.', '..' and the empty string.
#[repr(transparent)]
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathComponent {
    pub(super) inner: bytes::Bytes,
}

impl PathComponent {
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_ref()
    }
}

/// Checks whether `name` may appear as one component of a mapping path.
pub(super) fn is_valid_name(name: &[u8]) -> bool {
    !matches!(name, b"" | b"." | b"..") && !name.contains(&0x00) && !name.contains(&b'/')
}

impl AsRef<[u8]> for PathComponent {
    fn as_ref(&self) -> &[u8] {
        self.inner.as_ref()
    }
}

impl From<PathComponent> for bytes::Bytes {
    fn from(value: PathComponent) -> Self {
        value.inner
    }
}

impl TryFrom<bytes::Bytes> for PathComponent {
    type Error = Error;

    fn try_from(value: bytes::Bytes) -> Result<Self, Self::Error> {
        if !is_valid_name(&value) {
            return Err(Error::InvalidPath(value.as_bstr().to_owned()));
        }

        Ok(Self { inner: value })
    }
}

impl TryFrom<&str> for PathComponent {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if !is_valid_name(value.as_bytes()) {
            return Err(Error::InvalidPath(value.into()));
        }

        Ok(Self {
            inner: bytes::Bytes::copy_from_slice(value.as_bytes()),
        })
    }
}

impl Debug for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self.inner.as_bstr(), f)
    }
}

impl Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self.inner.as_bstr(), f)
    }
}
