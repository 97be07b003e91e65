//! Runtime adapters and the event-facing API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{dispatch, Event, StatusResponse};
pub use tokio_spawner::TokioSpawner;
