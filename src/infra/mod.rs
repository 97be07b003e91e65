//! In-memory and file-backed adapters for the collaborator interfaces.

pub mod fs;
pub mod handles;
pub mod log_parser;
pub mod notify;
pub mod persist;
pub mod stl;

pub use fs::InMemoryFs;
pub use handles::InMemoryHandleRegistry;
pub use log_parser::ScadLogParser;
pub use notify::LoggingNotifier;
pub use persist::{InMemoryStatePersister, JsonFilePersister};
pub use stl::{encode_binary_stl, BinaryStlParser};
