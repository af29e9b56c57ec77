//! Draft Reviser: selection-based revision engine for live text buffers
//!
//! A user selects a span of generated content, issues a natural-language
//! instruction, and an external rewrite service proposes a replacement for
//! exactly that span. This crate owns the part with invariants to protect:
//! applying the replacement back into a buffer that may have changed while
//! the round-trip was in flight.
//!
//! # Architecture
//!
//! All mutations compile down to a single primitive: [`Buffer::edit`], a
//! validated byte-span splice. Intelligence lives in span acquisition
//! (selection capture, exact-match relocation), not in the application
//! logic. The [`RevisionEngine`] serializes applies per buffer and
//! re-validates staleness independently on every apply.
//!
//! # Safety
//!
//! - Every splice verifies the target span before applying
//! - Relocation is exact-match only: original window first, then the
//!   occurrence nearest to the original offset, or an explicit failure
//! - All-or-nothing applies; no error path mutates the buffer
//! - Cancelled and superseded requests discard late replies
//! - Char-boundary and range validation on every offset
//!
//! # Example
//!
//! ```no_run
//! use draft_reviser::{Buffer, RestRewriteClient, RevisionEngine, Selection};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RevisionEngine::new(RestRewriteClient::new(
//!     "https://api.example.com/content/modify",
//! ));
//!
//! let mut buffer = Buffer::new("The cat sat on the mat.");
//! let selection = Selection::capture(&buffer, 4, 7)?.expect("non-empty");
//!
//! let applied = engine
//!     .revise(&mut buffer, selection, "make it more dramatic")
//!     .await?;
//! println!("replaced {:?} at {}", applied.replaced, applied.start);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod engine;
pub mod locate;
pub mod selection;
pub mod service;

// Re-exports
pub use buffer::{Buffer, BufferError, BufferId, EditOutcome};
pub use config::{load_from_path, load_from_str, ConfigError, Limits, ReviserConfig, ServiceConfig};
pub use engine::{
    AppliedRevision, RequestId, RevisionEngine, RevisionError, RevisionPreview, RevisionRequest,
};
pub use locate::ResolvedSpan;
pub use selection::Selection;
pub use service::{
    ChatRewriteClient, RestRewriteClient, RewriteRequest, RewriteResponse, RewriteService,
    ServiceError,
};
