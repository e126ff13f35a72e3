mod executor;
mod parse;

pub use executor::ToolExecutor;
pub use parse::parse_tool_call;
