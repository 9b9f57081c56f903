pub mod toml_loader;

pub use toml_loader::{load_exam_plan, load_spreadsheet_rows, ExamPlan, PlanBankSelection, PlanQuestion};
