pub mod answer_policy;
pub mod assembler;
pub mod bank_selector;
pub mod generation_job;
pub mod question_source;
pub mod spreadsheet_parser;
pub mod submission;
pub mod validator;

pub use answer_policy::{resolve_correct_index, AnswerMatchPolicy, AnswerResolution};
pub use assembler::QuestionListAssembler;
pub use bank_selector::{BankSelection, QuestionBankSelector};
pub use generation_job::{GenerationJobController, JobObserver, JobSnapshot, JobState, PollSettings};
pub use question_source::{ingest, QuestionSource};
pub use spreadsheet_parser::SpreadsheetQuestionParser;
pub use submission::ExamSubmissionCoordinator;
pub use validator::ExamDraftValidator;
