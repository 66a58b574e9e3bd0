pub mod context;
pub mod http;
pub mod router;
pub mod server;
pub mod subsystems;

pub use context::AppContext;
