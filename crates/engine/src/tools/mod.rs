pub mod handlers;
pub mod registry;

pub use registry::{ToolDispatchError, ToolHandler, ToolHandlerContext, ToolRegistry};
