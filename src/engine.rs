//! The revision engine: capture → dispatch → verified apply.
//!
//! The round-trip to the rewrite service is asynchronous and no lock is held
//! on the buffer while it is in flight; typing interleaves freely. That is
//! the entire reason staleness re-validation exists: every apply re-verifies
//! the selection against the buffer as it is *now*, relocating or failing
//! explicitly. Silent misplacement of edited text is the one behavior this
//! engine must never exhibit.

use crate::buffer::{Buffer, BufferError, BufferId, EditOutcome};
use crate::locate::{self, ResolvedSpan};
use crate::selection::Selection;
use crate::service::{RewriteRequest, RewriteService, ServiceError};
use similar::TextDiff;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Identifier of one revision round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An in-flight call to the rewrite service, bound to one buffer and one
/// captured selection. Built synchronously; consumed by one dispatch and at
/// most one apply.
#[derive(Debug, Clone)]
pub struct RevisionRequest {
    id: RequestId,
    buffer: BufferId,
    full_context: String,
    selection: Selection,
    instruction: String,
}

impl RevisionRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

#[derive(Error, Debug)]
pub enum RevisionError {
    /// Empty or whitespace-only instruction; rejected before any network
    /// activity.
    #[error("revision instruction is empty")]
    InvalidInstruction,

    #[error("revision instruction is {len} bytes, over the {max}-byte cap")]
    InstructionTooLong { len: usize, max: usize },

    /// The rewrite call itself failed; the buffer is untouched.
    #[error("rewrite service failed: {0}")]
    Service(#[from] ServiceError),

    /// Exact-match relocation failed at apply time. The revision is
    /// discarded rather than guessed; the buffer is untouched.
    #[error("selection no longer present in buffer: expected {expected:?}")]
    StaleSelection {
        expected: String,
        /// What now occupies the original window, if anything.
        found: Option<String>,
        /// Normalized similarity between expected and found, for the
        /// user-facing notification. Never used to pick a splice target.
        similarity: Option<f64>,
    },

    /// The request was cancelled or superseded; a late reply is discarded.
    #[error("revision request {id} was cancelled")]
    Cancelled { id: RequestId },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// A successfully applied revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRevision {
    /// Start of the replacement in the new content.
    pub start: usize,
    /// End of the replacement in the new content.
    pub end: usize,
    /// The text that was replaced.
    pub replaced: String,
    pub outcome: EditOutcome,
}

/// Non-mutating preview of what an apply would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPreview {
    pub span: ResolvedSpan,
    /// Unified diff of the whole buffer, before vs after.
    pub diff: String,
}

/// Serialization point for revisions against live buffers.
///
/// Holds the rewrite collaborator and a registry of pending requests, one
/// per buffer at most: a new request against a buffer supersedes (cancels)
/// the prior pending one. Applies happen in arrival order, each re-validated
/// independently.
pub struct RevisionEngine<S> {
    service: S,
    max_instruction_len: Option<usize>,
    next_request_id: AtomicU64,
    pending: Mutex<HashMap<BufferId, RequestId>>,
}

impl<S: RewriteService> RevisionEngine<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            max_instruction_len: None,
            next_request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Cap instruction length in bytes (see `Limits` in the config).
    pub fn with_max_instruction_len(mut self, max: usize) -> Self {
        self.max_instruction_len = Some(max);
        self
    }

    /// Build a revision request for a captured selection.
    ///
    /// Validates the instruction, snapshots the full buffer content as
    /// context, and registers the request as the buffer's single pending
    /// request, superseding any prior one.
    pub fn request_revision(
        &self,
        buffer: &Buffer,
        selection: Selection,
        instruction: &str,
    ) -> Result<RevisionRequest, RevisionError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(RevisionError::InvalidInstruction);
        }
        if let Some(max) = self.max_instruction_len {
            if instruction.len() > max {
                return Err(RevisionError::InstructionTooLong {
                    len: instruction.len(),
                    max,
                });
            }
        }

        let id = RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let superseded = self
            .pending
            .lock()
            .expect("pending registry poisoned")
            .insert(buffer.id(), id);

        if let Some(old) = superseded {
            tracing::warn!(request = %old, superseded_by = %id, "pending revision superseded");
        }
        tracing::debug!(request = %id, selected = selection.selected_text(), "revision requested");

        Ok(RevisionRequest {
            id,
            buffer: buffer.id(),
            full_context: buffer.content().to_string(),
            selection,
            instruction: instruction.to_string(),
        })
    }

    /// Round-trip to the rewrite service.
    ///
    /// Non-blocking for the editing surface: the buffer is not borrowed
    /// here, so typing proceeds while the call is in flight. Cancellation is
    /// checked on both sides of the await; a reply that arrives for a
    /// cancelled request is discarded, never applied.
    pub async fn dispatch(&self, request: &RevisionRequest) -> Result<String, RevisionError> {
        if !self.is_live(request) {
            return Err(RevisionError::Cancelled { id: request.id });
        }

        let wire = RewriteRequest {
            full_context: request.full_context.clone(),
            selected_text: request.selection.selected_text().to_string(),
            instruction: request.instruction.clone(),
        };

        let result = self.service.rewrite(&wire).await;

        match result {
            Err(err) => {
                self.complete(request);
                tracing::error!(request = %request.id, error = %err, "rewrite service failed");
                Err(RevisionError::Service(err))
            }
            Ok(replacement) => {
                if !self.is_live(request) {
                    tracing::warn!(request = %request.id, "late rewrite reply discarded");
                    return Err(RevisionError::Cancelled { id: request.id });
                }
                Ok(replacement)
            }
        }
    }

    /// Apply the service's replacement back into the buffer.
    ///
    /// All-or-nothing: the buffer mutates only on a resolvable, verified
    /// span. The selection is re-validated here regardless of what was true
    /// at dispatch time.
    pub fn apply_revision(
        &self,
        buffer: &mut Buffer,
        request: &RevisionRequest,
        replacement: &str,
    ) -> Result<AppliedRevision, RevisionError> {
        if !self.is_live(request) {
            return Err(RevisionError::Cancelled { id: request.id });
        }

        let span = match self.resolve_span(buffer, request) {
            Ok(span) => span,
            Err(err) => {
                self.complete(request);
                tracing::warn!(request = %request.id, "revision discarded: selection stale");
                return Err(err);
            }
        };

        let replaced = buffer.content()[span.start..span.end].to_string();
        let outcome = buffer.edit(span.start, span.end, replacement)?;
        self.complete(request);

        tracing::debug!(
            request = %request.id,
            start = span.start,
            end = span.start + replacement.len(),
            "revision applied"
        );

        Ok(AppliedRevision {
            start: span.start,
            end: span.start + replacement.len(),
            replaced,
            outcome,
        })
    }

    /// Resolve where an apply would splice, without mutating anything, and
    /// render the change as a unified diff for a confirmation surface.
    pub fn preview_revision(
        &self,
        buffer: &Buffer,
        request: &RevisionRequest,
        replacement: &str,
    ) -> Result<RevisionPreview, RevisionError> {
        let span = self.resolve_span(buffer, request)?;

        let before = buffer.content();
        let mut after = String::with_capacity(before.len() - (span.end - span.start) + replacement.len());
        after.push_str(&before[..span.start]);
        after.push_str(replacement);
        after.push_str(&before[span.end..]);

        let diff = TextDiff::from_lines(before, &after)
            .unified_diff()
            .header("current", "revised")
            .to_string();

        Ok(RevisionPreview { span, diff })
    }

    /// Discard a pending request. Idempotent; never mutates the buffer.
    pub fn cancel_pending(&self, request: &RevisionRequest) {
        let mut pending = self.pending.lock().expect("pending registry poisoned");
        if pending.get(&request.buffer) == Some(&request.id) {
            pending.remove(&request.buffer);
            tracing::debug!(request = %request.id, "pending revision cancelled");
        }
    }

    /// Whether this request is still the buffer's live pending request.
    pub fn is_live(&self, request: &RevisionRequest) -> bool {
        self.pending
            .lock()
            .expect("pending registry poisoned")
            .get(&request.buffer)
            == Some(&request.id)
    }

    /// Capture, dispatch, and apply in one call, for callers that do not
    /// interleave edits of their own while the request is in flight.
    pub async fn revise(
        &self,
        buffer: &mut Buffer,
        selection: Selection,
        instruction: &str,
    ) -> Result<AppliedRevision, RevisionError> {
        let request = self.request_revision(buffer, selection, instruction)?;
        let replacement = self.dispatch(&request).await?;
        self.apply_revision(buffer, &request, replacement.as_str())
    }

    fn complete(&self, request: &RevisionRequest) {
        let mut pending = self.pending.lock().expect("pending registry poisoned");
        if pending.get(&request.buffer) == Some(&request.id) {
            pending.remove(&request.buffer);
        }
    }

    /// Staleness check per the relocation policy.
    ///
    /// The original window is verified first even when the version is
    /// unchanged - a splice is never blind. The occurrence scan is reached
    /// only when the window no longer holds the selected text.
    fn resolve_span(
        &self,
        buffer: &Buffer,
        request: &RevisionRequest,
    ) -> Result<ResolvedSpan, RevisionError> {
        let selection = &request.selection;

        if let Some(span) = locate::relocate(buffer.content(), selection) {
            return Ok(span);
        }

        let diagnostic = locate::stale_window_diagnostic(buffer.content(), selection);
        let (found, similarity) = match diagnostic {
            Some((found, similarity)) => (Some(found), Some(similarity)),
            None => (None, None),
        };

        Err(RevisionError::StaleSelection {
            expected: selection.selected_text().to_string(),
            found,
            similarity,
        })
    }
}
