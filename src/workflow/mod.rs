pub mod draft_session;
pub mod observer;

pub use draft_session::{Collaborators, ExamDraftSession};
pub use observer::{DraftObserver, TracingObserver};
