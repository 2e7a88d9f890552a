//! Service handlers.

pub mod admin_oper;

pub use admin_oper::{AdminOperParams, AdminOperResponse, GetAdminOperHandler};
pub use crate::error::{HandlerError, HandlerResult};
