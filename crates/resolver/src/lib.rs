//! # Metahint Resolver
//!
//! Turns noisy upstream game payloads into one stable location identifier.
//!
//! ```text
//! round / game payload (any mode, any API revision)
//!     │
//!     ├──> Extractor  (fixed probe precedence, first non-empty wins)
//!     │      └─> Codec (hex -> canonical panorama id)
//!     │
//!     └──> LocationLock (debounce while the result view is up)
//!            └─> adopted LocationId
//! ```

mod codec;
mod extractor;
mod game;
mod lock;
mod retry;

pub use codec::{decode_location_id, MIN_ENCODED_LEN};
pub use extractor::{
    extract_canonical_id, extract_current_round, extract_round, ExtractedRound, IdSource,
};
pub use game::{is_competitive_url, GameRef};
pub use lock::{LocationLock, LockEvent, LockState, RejectReason, MIN_PLAUSIBLE_LEN};
pub use retry::{retry_until_some, RetryPolicy};
