//! Web API 层。
//!
//! 提供 Axum 路由和 WebSocket 会话，将请求委托给匹配、会话和通知服务。

mod auth;
mod error;
mod routes;
mod state;
mod ws_connection;

pub use auth::{AuthUser, Claims, JwtService};
pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
