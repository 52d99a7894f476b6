//! Per-kind node handlers, tool dispatch, and conditional routing (spec
//! §4.3). `nebula-engine`'s step driver calls into [`handlers`] once per
//! node and uses [`collaborators`] to reach outside the workspace.

pub mod collaborators;
pub mod conditional;
pub mod handlers;
pub mod jsonpath;
pub mod retry;
pub mod tool_name;

pub use collaborators::{
    AgentInvocation, AgentInvoker, CredentialBroker, ResolvedCredential, ToolCallResponse,
    ToolTransport, ToolTransportError,
};
pub use handlers::{dispatch_agent, dispatch_conditional, dispatch_input, dispatch_output, dispatch_tool};
