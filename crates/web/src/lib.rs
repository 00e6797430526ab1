//! # Barangay Web
//!
//! HTTP surface của portal (axum). Bốn nhóm route:
//! - `/au`: login, register, logout
//! - `/resident`, `/secretary`, `/treasurer`: role-gated pages và actions
//!
//! POST actions trả `303 See Other` kèm flash message; GET pages trả JSON
//! view model cùng các flash đang chờ.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use routes::create_router;
pub use session::{Session, SessionStore};
pub use state::AppState;

use std::future::Future;
use tokio::net::TcpListener;

/// Serve the portal until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}
