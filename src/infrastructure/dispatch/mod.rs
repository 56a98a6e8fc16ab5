//! Intent classification and handler dispatch

mod dispatcher;
pub mod handlers;

pub use dispatcher::IntentDispatcher;
