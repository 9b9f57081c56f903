pub mod bank;
pub mod exam;
pub mod generation;
pub mod loaders;
pub mod payload;
pub mod question;
pub mod spreadsheet;

pub use bank::{BankFilter, BankQuestion};
pub use exam::{format_wall_clock, parse_local_datetime, ExamDraft, ExamDraftMetadata, SubmitMode};
pub use generation::{GeneratedQuestion, GenerationRequest};
pub use loaders::{load_exam_plan, load_spreadsheet_rows, ExamPlan};
pub use payload::{ExamPayload, PersistedExam, PersistedQuestion, QuestionPayload};
pub use question::{QuestionDraft, QuestionId, OPTION_COUNT};
pub use spreadsheet::SpreadsheetRow;
