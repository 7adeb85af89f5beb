//! Commands Layer
//!
//! Request handlers that bridge clients to the services. Each handler
//! resolves the caller's credential before touching any state.

mod list_cmd;
mod item_cmd;
mod item_set_cmd;
mod user_cmd;
mod activity_cmd;
mod recipe_cmd;
mod dispatch;

#[cfg(test)]
mod tests;

pub use list_cmd::*;
pub use item_cmd::*;
pub use item_set_cmd::*;
pub use user_cmd::*;
pub use activity_cmd::*;
pub use recipe_cmd::*;
pub use dispatch::{dispatch, handle_line, Envelope, Request, Response};
