use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Opaque handle identity for a live buffer.
///
/// The engine tracks pending revision requests per buffer; the id lets it do
/// so without holding a borrow of the buffer across the service round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

impl BufferId {
    fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The authoritative text content for one generated artifact.
///
/// Every mutation (typing, deletion, an applied revision) compiles down to
/// the single [`Buffer::edit`] primitive: a validated byte-span splice.
/// Intelligence lives in span acquisition (selection capture, relocation),
/// not in application.
///
/// `version` increases by exactly 1 per accepted mutation. An edit whose
/// replacement equals the text already in the span reports
/// [`EditOutcome::Unchanged`] and leaves `version` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    id: BufferId,
    content: String,
    version: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("invalid byte range: [{start}, {end}) in buffer of length {len}")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("offset {offset} is not a char boundary")]
    NotCharBoundary { offset: usize },
}

/// Result of applying an edit to a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The span was replaced and `version` was bumped.
    Applied {
        bytes_removed: usize,
        bytes_inserted: usize,
    },
    /// The replacement equals the current span text; nothing changed.
    Unchanged,
}

impl Buffer {
    /// Create a buffer around freshly generated content. Version starts at 0.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: BufferId::next(),
            content: content.into(),
            version: 0,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Validate a byte span against the current content.
    ///
    /// Returns the text currently at `[start, end)` if the span is in bounds
    /// and both offsets sit on char boundaries.
    pub(crate) fn span(&self, start: usize, end: usize) -> Result<&str, BufferError> {
        if start > end || end > self.content.len() {
            return Err(BufferError::InvalidRange {
                start,
                end,
                len: self.content.len(),
            });
        }
        for offset in [start, end] {
            if !self.content.is_char_boundary(offset) {
                return Err(BufferError::NotCharBoundary { offset });
            }
        }
        Ok(&self.content[start..end])
    }

    /// Replace `[start, end)` with `replacement`, bumping `version`.
    ///
    /// All-or-nothing: on any validation error the buffer is left untouched.
    pub fn edit(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
    ) -> Result<EditOutcome, BufferError> {
        let current = self.span(start, end)?;

        if current == replacement {
            return Ok(EditOutcome::Unchanged);
        }

        let removed = end - start;
        let mut next =
            String::with_capacity(self.content.len() - removed + replacement.len());
        next.push_str(&self.content[..start]);
        next.push_str(replacement);
        next.push_str(&self.content[end..]);

        self.content = next;
        self.version += 1;

        Ok(EditOutcome::Applied {
            bytes_removed: removed,
            bytes_inserted: replacement.len(),
        })
    }

    /// Insert text at `offset` (the typing path).
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<EditOutcome, BufferError> {
        self.edit(offset, offset, text)
    }

    /// Delete `[start, end)`.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<EditOutcome, BufferError> {
        self.edit(start, end, "")
    }
}
