//! CLI commands

mod check;
mod completions;
mod publish;

pub use check::CheckCommand;
pub use completions::CompletionsCommand;
pub use publish::PublishCommand;
