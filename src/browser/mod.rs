//! Browser automation module
//!
//! The remote-control seam, the agent-browser transport, and a scripted page
//! for tests.

mod executor;
pub mod mock;
mod remote;
pub mod state;

pub use executor::AgentBrowser;
pub use mock::{MockPage, Mutation};
pub use remote::RemoteControl;
pub use state::ElementState;
