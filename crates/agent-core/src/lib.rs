//! # agent-core
//!
//! Core agent logic with provider-agnostic LLM abstraction and extensible tool system.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Bounded    │  │    Tools    │  │   LlmProvider       │  │
//! │  │  Tool Loop  │──│   Registry  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, a local
//! OpenAI-compatible server, or the scripted test provider without
//! changing agent logic.

pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role, ToolCallRequest};
pub use mock::ScriptedProvider;
pub use provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentOutcome, LoopState};
pub use tool::{Tool, ToolCall, ToolCallRecord, ToolRegistry, ToolResult, ToolSchema};
