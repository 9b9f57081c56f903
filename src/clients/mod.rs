pub mod backend_client;
pub mod collaborators;

pub use backend_client::HttpBackend;
pub use collaborators::{ExamStore, GenerationApi, QuestionBankApi, SessionContext, StaticSession};
