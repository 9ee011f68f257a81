mod analyze;
mod apply;
mod build;
mod fix;
mod init;
mod parse;
mod project;

pub use analyze::run_analyze;
pub use apply::{run_apply, run_chat};
pub use build::run_build;
pub use fix::run_fix;
pub use init::run_init;
pub use parse::{read_input, run_parse};
pub use project::{print_build, print_report, Project};
