//! The orchestration engine — C6/C7/C9/C11 (spec §4.4, §4.5, §4.7, §4.9).
//!
//! [`Engine`] ties the validator/identity caches, the progress bus, the
//! retention store, and the handler collaborators together behind one
//! `submit`/`subscribe`/`provide_input`/`cancel` surface. Everything else in
//! this crate is a piece `driver` composes: [`config`] is the typed knobs,
//! [`record`] is what gets persisted, [`retention`] is where it lives,
//! [`input_gate`] decides when to pause, and [`gather`] collects a step's
//! input from its predecessors.

pub mod collaborators;
pub mod config;
pub mod driver;
pub mod gather;
pub mod input_gate;
pub mod record;
pub mod retention;

pub use collaborators::{AgentInvoker, CredentialBroker, GraphStore, NoopGraphStore, ToolTransport};
pub use config::EngineConfig;
pub use driver::{Engine, Submission};
pub use record::ExecutionRecord;
