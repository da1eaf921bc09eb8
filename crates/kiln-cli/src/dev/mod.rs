//! Development server.
//!
//! - in-memory artifacts served under `devServer.publicPath`
//! - live reload over Server-Sent Events
//! - rebuilds on file change, cancelling any build still running
//! - an error overlay while the last build is failing

pub mod error_overlay;
pub mod runner;
pub mod server;
pub mod state;
pub mod watcher;

pub use runner::DevRunner;
pub use server::{DevServer, router};
pub use state::{AssetCache, BuildStatus, CachedAsset, DevServerState, SharedState};
pub use watcher::{DEFAULT_IGNORES, FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events pushed to live-reload clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    /// A rebuild started.
    BuildStarted { generation: u64 },

    /// The rebuild finished without errors. Clients reload.
    BuildCompleted {
        generation: u64,
        duration_ms: u64,
        assets: usize,
    },

    /// The rebuild left errors. Clients show the overlay.
    BuildFailed { generation: u64, errors: Vec<String> },
}

impl DevEvent {
    pub fn generation(&self) -> u64 {
        match self {
            DevEvent::BuildStarted { generation }
            | DevEvent::BuildCompleted { generation, .. }
            | DevEvent::BuildFailed { generation, .. } => *generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = DevEvent::BuildFailed {
            generation: 3,
            errors: vec!["boom".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BuildFailed");
        assert_eq!(json["generation"], 3);
        assert_eq!(json["errors"][0], "boom");
        assert_eq!(event.generation(), 3);
    }
}
