//! Draft auto-save controller for the submission editor.
//!
//! A [`DraftController`] owns the editable fields of one submission while it
//! is open in the editor. Edits are buffered locally and flushed to the
//! [`SubmissionStore`](outbox_core::store::SubmissionStore) after a quiet
//! period, one write at a time. The view observes progress through
//! [`DraftSnapshot`]s published on a watch channel.
//!
//! ```rust,ignore
//! let draft = DraftController::load(store, id, DraftConfig::default()).await?;
//! let mut view = draft.subscribe();
//! draft.set_field(FieldEdit::Subject("Hello".into())).await?;
//! view.changed().await?;
//! ```

mod controller;

pub mod config;
pub mod error;
pub mod snapshot;
pub mod timer;
pub mod validate;

pub use config::DraftConfig;
pub use controller::DraftController;
pub use error::{ApprovalError, DraftError, Result};
pub use snapshot::{DraftSnapshot, SaveStatus};
