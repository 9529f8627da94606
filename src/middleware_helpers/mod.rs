pub mod bootstrap;

pub use bootstrap::bootstrap_middleware;
