//! Commands Layer
//!
//! HTTP handlers that bridge the admin and public pages to the repositories.

mod health_cmd;
mod ics_cmd;
mod menu_cmd;
mod reservation_cmd;
mod response;
mod website_cmd;

pub use health_cmd::*;
pub use ics_cmd::*;
pub use menu_cmd::*;
pub use reservation_cmd::*;
pub use response::{no_cache, parse_body, success, ApiError, ApiResult};
pub use website_cmd::*;
