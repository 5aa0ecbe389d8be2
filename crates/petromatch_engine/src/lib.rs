//! PetroMatch engine: backend client and effect execution for the dashboard core.
mod client;
mod orchestrator;
mod scope;
mod settings;

pub use client::{CredentialProvider, ReqwestTaskClient, StaticToken, TaskClient};
pub use orchestrator::{EventStream, Orchestrator};
pub use settings::{ClientSettings, EngineError};

pub use petromatch_core::{DashboardSettings, MatchStart, PollPolicy};
