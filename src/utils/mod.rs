pub mod dispatch;
pub mod logging;

pub use dispatch::SerialDispatcher;
pub use logging::truncate_text;
