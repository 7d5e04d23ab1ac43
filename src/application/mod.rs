//! Application layer - Use cases and orchestration.
//!
//! Services depend on domain ports (traits) rather than concrete
//! implementations. The controller applies user interactions to a session.

pub mod controller;
pub mod services;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use controller::{Interaction, Reply, SessionController, ViewLimits};
pub use services::{DocumentService, OcrService, RagService, StudyService};
pub use session::{SessionContext, SessionRegistry, SessionSnapshot};
