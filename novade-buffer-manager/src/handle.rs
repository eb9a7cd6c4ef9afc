//! Native buffer handles and their owning wrapper.

use std::fmt;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::buffer::BufferId;
use crate::error::BufferError;

/// Plain descriptor data for a graphics buffer: file descriptors plus opaque
/// integers, as handed over by a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle {
    pub buffer_id: BufferId,
    pub fds: Vec<i32>,
    pub ints: Vec<i32>,
}

impl NativeHandle {
    pub fn new(buffer_id: BufferId, fds: Vec<i32>, ints: Vec<i32>) -> Self {
        Self { buffer_id, fds, ints }
    }
}

/// Acquires and releases the process-local reference behind a [`NativeHandle`].
#[cfg_attr(test, automock)]
pub trait HandleImporter: Send + Sync {
    /// Takes one reference on the buffer.
    fn import_buffer(&self, handle: &NativeHandle) -> Result<(), BufferError>;

    /// Drops a reference taken by [`HandleImporter::import_buffer`].
    fn free_buffer(&self, handle: &NativeHandle);
}

/// Owns one buffer reference and releases it when dropped.
///
/// Imported handles are freed through their importer exactly once. Cloned
/// handles (sideband streams) only carry the descriptor and free nothing.
pub struct BufferHandle {
    native: NativeHandle,
    importer: Option<Arc<dyn HandleImporter>>,
}

impl BufferHandle {
    /// Imports `native` through `importer` and takes ownership of the reference.
    pub fn import(importer: Arc<dyn HandleImporter>, native: &NativeHandle) -> Result<Self, BufferError> {
        importer.import_buffer(native)?;
        Ok(Self {
            native: native.clone(),
            importer: Some(importer),
        })
    }

    /// Wraps a copy of `native` without importing it.
    pub fn cloned(native: &NativeHandle) -> Self {
        Self {
            native: native.clone(),
            importer: None,
        }
    }

    pub fn native(&self) -> &NativeHandle {
        &self.native
    }

    pub fn id(&self) -> BufferId {
        self.native.buffer_id
    }

    pub fn is_imported(&self) -> bool {
        self.importer.is_some()
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("native", &self.native)
            .field("imported", &self.is_imported())
            .finish()
    }
}

impl Drop for BufferHandle {
    fn drop(&mut self) {
        if let Some(importer) = self.importer.take() {
            importer.free_buffer(&self.native);
        }
    }
}
