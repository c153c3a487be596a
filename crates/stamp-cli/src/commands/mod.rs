//! One module per subcommand. Handlers translate arguments into adapter and
//! service calls and render the result; no business logic lives here.

pub mod check;
pub mod completions;
pub mod config;
pub mod generate;
pub mod init;
pub mod list;
pub mod new;
pub mod validate_name;
