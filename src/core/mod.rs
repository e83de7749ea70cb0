pub mod events;
pub mod filter;
pub mod progress;
pub mod queue;
pub mod scanner;
pub mod session;
