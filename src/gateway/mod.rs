pub mod diff;
pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{RpcRequest, RpcResponse};
pub use server::ToolGateway;
pub use tools::{Tool, ToolCall, ToolError, ToolName};
