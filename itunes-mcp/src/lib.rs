//! JSON-RPC message shapes and tool/resource dispatch for `itunes-mcp`,
//! split out as a library so integration tests can drive the dispatcher
//! without going through the stdio transport.

pub mod rpc;
pub mod server;
