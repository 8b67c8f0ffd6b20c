//! Source images and the byte-retrieval seam.
//!
//! The core never fetches from storage itself. A [`SourceImage`] carries an
//! opaque [`ByteSource`] supplied by the caller; the engine asks it for bytes
//! once, when the image's turn comes in the batch.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Failure to retrieve the raw bytes behind a source image.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Something that can hand over the encoded bytes of one image.
pub trait ByteSource {
    /// Return the full encoded file contents.
    fn read_bytes(&self) -> Result<Cow<'_, [u8]>, FetchError>;
}

impl ByteSource for Vec<u8> {
    fn read_bytes(&self) -> Result<Cow<'_, [u8]>, FetchError> {
        Ok(Cow::Borrowed(self.as_slice()))
    }
}

impl ByteSource for Arc<[u8]> {
    fn read_bytes(&self) -> Result<Cow<'_, [u8]>, FetchError> {
        Ok(Cow::Borrowed(&self[..]))
    }
}

impl ByteSource for &'static [u8] {
    fn read_bytes(&self) -> Result<Cow<'_, [u8]>, FetchError> {
        Ok(Cow::Borrowed(*self))
    }
}

/// A caller-owned reference to one image in a batch.
#[derive(Clone)]
pub struct SourceImage {
    /// Stable identifier reported back on failure.
    pub id: String,
    /// Base name for the output entry (`<display_name>.<ext>`).
    pub display_name: String,
    bytes: Arc<dyn ByteSource>,
}

impl SourceImage {
    /// Create a source backed by any [`ByteSource`].
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        bytes: impl ByteSource + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Create a source from an in-memory buffer.
    pub fn from_bytes(id: impl Into<String>, display_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(id, display_name, bytes)
    }

    /// Retrieve the encoded bytes.
    pub fn read_bytes(&self) -> Result<Cow<'_, [u8]>, FetchError> {
        self.bytes.read_bytes()
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}
