//! JSON-RPC surface: message types, the server-side dispatcher, and a client

mod client;
mod dispatcher;
mod messages;

pub use client::{DEFAULT_URL, RpcClient, RpcClientError};
pub use dispatcher::{Dispatcher, PROTOCOL_VERSION, SERVER_NAME};
pub use messages::{JSONRPC_VERSION, RpcError, RpcRequest, RpcResponse, TOOL_ERROR};
