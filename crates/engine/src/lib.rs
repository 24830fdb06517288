//! Engine crate – headless core of the web app wrapper.
//!
//! Holds the engine catalog, availability rules, selection state, the
//! application menu schema and the small user/dialog models. It does NOT
//! depend on any GUI runtime, so the desktop host and the headless CLI
//! harness drive the same code.

pub mod availability;
pub mod catalog;
pub mod commands;
pub mod context;
pub mod dialog;
pub mod doctor;
pub mod menu;
pub mod platform;
pub mod presentation;
pub mod scenario;
pub mod selection;
pub mod traits;
pub mod types;
pub mod user;

// Re-exports for convenience
pub use availability::{resolve, AvailabilityContext, AvailabilityResult};
pub use catalog::{EngineCatalog, EngineDescriptor, Platform, Variant};
pub use commands::CommandRegistry;
pub use context::{AppContext, ContextOptions};
pub use selection::{SelectOutcome, SelectionKey, SelectionRejected, SelectionState};
pub use types::{CommandResult, ErrorCode, ErrorInfo, Status};
