//! Orchestration loop.
//!
//! Edits and applied assistant responses go into a per-project session
//! actor, which debounces them into builds, renders the latest artifact and
//! keeps the conversation, terminal log and output text.

mod prompts;
mod registry;
mod scheduler;
mod session;
mod terminal;

pub use prompts::{
    analysis_prompt, build_error_seed, failure_output, runtime_output, success_output,
    system_prompt, terminal_seed, AnalyzeAction, ANALYSIS_SYSTEM_PROMPT, PROTOCOL_INSTRUCTIONS,
};
pub use registry::{project_id, SessionRegistry};
pub use scheduler::{BuildScheduler, BuildState, Completion};
pub use session::{
    BuildOutcome, Builder, Collaborators, Session, SessionConfig, SessionHandle, SessionSnapshot,
    TurnReport,
};
pub use terminal::{run_commands, TerminalRun};
