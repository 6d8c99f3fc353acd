//! In-memory [`crate::dao::quiz_store::QuizStore`] backend.
//!
//! The default store: every session's data sits behind its own async mutex,
//! acquired with a bounded wait so a stuck writer surfaces as a busy error
//! instead of hanging its peers. Suitable for single-process deployments and
//! for tests; the trait seam keeps an external database as a drop-in option.

mod store;

pub use store::MemoryQuizStore;
