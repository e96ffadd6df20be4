pub mod commands;
pub mod context;
pub mod logging;
pub mod repl;

pub use context::AppContext;
pub use repl::readline;
