//! CLI command handlers, one file per command.

mod add;
mod cancel;
mod completions;
mod retry;
mod run;
mod show;
mod status;
mod watch;

pub use add::run_add;
pub use cancel::run_cancel;
pub use completions::run_completions;
pub use retry::run_retry;
pub use run::run_queue;
pub use show::run_show;
pub use status::run_status;
