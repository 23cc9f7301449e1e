//! Voice command routing
//!
//! Both assistants share one matching rule ([`RouteTable::route`]) and differ
//! only in their phrase tables.

mod assistant;
mod table;

pub use assistant::{AssistantKind, AssistantState, VoiceAssistant};
pub use table::{RouteEntry, RouteOutcome, RouteTable};
