pub mod executor;

pub use executor::{render_command, CommandOutput, CommandRunner, SystemRunner};
