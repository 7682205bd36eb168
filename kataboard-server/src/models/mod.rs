//! Domain models shared by the repositories, handlers and seed loader
//!
//! Input is coerced into these types at the edges. Coercion failures return
//! ValidationError, not panic.

pub mod validation;
pub mod timestamp;
pub mod challenge;
pub mod conversation;

pub use validation::ValidationError;
pub use timestamp::{to_iso8601, EpochMillis};
pub use challenge::NewChallenge;
pub use conversation::{ConversationId, NewConversation, NewPost};
