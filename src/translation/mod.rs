/*!
 * Translation machinery.
 *
 * - `call_layer`: resilient provider dispatch with retries and fallback
 * - `chunker`: token-budgeted batch sizing
 * - `context`: ephemeral per-chapter rolling context
 * - `validator`: indexed-response parsing and structural invariants
 * - `prompts`: request builders for every pipeline stage
 * - `editor`: best-effort stylistic refinement pass
 */

pub mod call_layer;
pub mod chunker;
pub mod context;
pub mod editor;
pub mod prompts;
pub mod validator;

pub use call_layer::{CallCandidate, RequestMode, ResilientCaller};
pub use chunker::TokenBudgetChunker;
pub use context::ChapterContext;
pub use editor::Editor;
