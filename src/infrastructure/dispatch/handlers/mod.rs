//! Built-in intent handlers

mod aftersales;
mod chitchat;
mod order;
mod product;

pub use aftersales::AftersalesHandler;
pub use chitchat::ChitchatHandler;
pub use order::OrderHandler;
pub use product::ProductHandler;
