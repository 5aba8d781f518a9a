mod connection;
mod directory;
pub mod protocol;
pub mod registry;
mod routes;
mod server;
mod state;
pub mod turn;

pub use protocol::{ClientFrame, EventKind, ServerEvent, StepInfo};
pub use registry::{ConnectionRegistry, SessionInfo, SessionStatus};
pub use server::GatewayServer;
