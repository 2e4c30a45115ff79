//! Data structures for the destination paths of an input mapping.
//!
//! Mapping paths are always relative to the sandbox (or execution) root
//! and platform-independent, which distinguishes them from the ones
//! provided in the standard library. An absolute destination can not be
//! constructed, so the "never escapes the root" invariant holds by type.
use bstr::ByteSlice;
use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::{self, Debug, Display},
    mem,
    ops::Deref,
    str::FromStr,
};

use crate::Error;

mod component;
pub use component::PathComponent;

/// A borrowed mapping path.
/// Components are separated by slashes; each component must be a valid
/// name per [PathComponent]. The empty path ([Path::ROOT]) addresses the
/// sandbox root itself and is the identity element of [Path::join].
#[derive(Eq, Hash, PartialEq)]
#[repr(transparent)] // SAFETY: Representation has to match [u8]
pub struct Path {
    inner: [u8],
}

impl Path {
    // SAFETY: The empty path is valid.
    pub const ROOT: &'static Path = unsafe { Path::from_bytes_unchecked(&[]) };

    /// Convert a byte slice to a path, without checking validity.
    const unsafe fn from_bytes_unchecked(bytes: &[u8]) -> &Path {
        // SAFETY: &[u8] and &Path have the same representation.
        unsafe { mem::transmute(bytes) }
    }

    fn from_bytes(bytes: &[u8]) -> Option<&Path> {
        if !bytes.is_empty() {
            for component in bytes.split_str(b"/") {
                if !component::is_valid_name(component) {
                    return None;
                }
            }
        }

        // SAFETY: We have verified that all components are valid names,
        // which also rules out leading or doubled separators.
        Some(unsafe { Path::from_bytes_unchecked(bytes) })
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the path without its final component, if there is one.
    ///
    /// Note that the parent of a bare file name is [Path::ROOT].
    /// [Path::ROOT] is the only path without a parent.
    pub fn parent(&self) -> Option<&Path> {
        if self.inner.is_empty() {
            return None;
        }

        Some(
            if let Some((parent, _file_name)) = self.inner.rsplit_once_str(b"/") {
                // SAFETY: The parent of a valid Path is a valid Path.
                unsafe { Path::from_bytes_unchecked(parent) }
            } else {
                Path::ROOT
            },
        )
    }

    /// Creates a PathBuf with the relative path `rest` adjoined to self.
    /// Both sides are already validated, so joining can not fail; joining
    /// [Path::ROOT] on either side is the identity.
    pub fn join(&self, rest: &Path) -> PathBuf {
        if self.inner.is_empty() {
            return rest.to_owned();
        }
        if rest.inner.is_empty() {
            return self.to_owned();
        }

        let mut inner = Vec::with_capacity(self.inner.len() + rest.inner.len() + 1);
        inner.extend_from_slice(&self.inner);
        inner.push(b'/');
        inner.extend_from_slice(&rest.inner);

        PathBuf { inner }
    }

    /// Provides an iterator over the components of the path,
    /// which are individual [PathComponent].
    /// In case the path is empty, an empty iterator is returned.
    pub fn components(&self) -> impl Iterator<Item = PathComponent> + '_ {
        self.components_bytes().map(|b| PathComponent {
            inner: bytes::Bytes::copy_from_slice(b),
        })
    }

    /// Produces an iterator over the components of the path, which are
    /// individual byte slices.
    /// In case the path is empty, an empty iterator is returned.
    pub fn components_bytes(&self) -> impl Iterator<Item = &[u8]> {
        let mut iter = self.inner.split_str(&b"/");

        // We don't want to return an empty element, consume it if it's the only one.
        if self.inner.is_empty() {
            let _ = iter.next();
        }

        iter
    }

    /// Returns the final component of the Path, if there is one.
    pub fn file_name(&self) -> Option<&[u8]> {
        self.components_bytes().last()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }
}

// Destination tables are exposed in path-sorted order; byte-wise
// comparison keeps that order stable across platforms.
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self.inner.as_bstr(), f)
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self.inner.as_bstr(), f)
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

/// The owned variant of [Path].
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PathBuf {
    inner: Vec<u8>,
}

impl Deref for PathBuf {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        // SAFETY: PathBuf always contains a valid Path.
        unsafe { Path::from_bytes_unchecked(&self.inner) }
    }
}

impl AsRef<Path> for PathBuf {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl ToOwned for Path {
    type Owned = PathBuf;

    fn to_owned(&self) -> Self::Owned {
        PathBuf {
            inner: self.inner.to_owned(),
        }
    }
}

impl Borrow<Path> for PathBuf {
    fn borrow(&self) -> &Path {
        self
    }
}

impl From<&Path> for PathBuf {
    fn from(value: &Path) -> Self {
        value.to_owned()
    }
}

impl FromStr for PathBuf {
    type Err = Error;

    fn from_str(s: &str) -> Result<PathBuf, Self::Err> {
        PathBuf::try_from(s.as_bytes())
    }
}

impl TryFrom<&[u8]> for PathBuf {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<PathBuf, Self::Error> {
        Ok(Path::from_bytes(bytes)
            .ok_or_else(|| Error::InvalidPath(bytes.as_bstr().to_owned()))?
            .to_owned())
    }
}

impl Debug for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&**self, f)
    }
}

impl Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&**self, f)
    }
}

impl PathBuf {
    pub fn new() -> PathBuf {
        Self::default()
    }

    /// Adjoins the single component `name` to self.
    pub fn try_push(&mut self, name: &[u8]) -> Result<(), Error> {
        if !component::is_valid_name(name) {
            return Err(Error::InvalidPath(name.as_bstr().to_owned()));
        }

        if !self.inner.is_empty() {
            self.inner.push(b'/');
        }

        self.inner.extend_from_slice(name);

        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }
}
