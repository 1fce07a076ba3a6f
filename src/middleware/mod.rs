pub mod auth;
pub mod response;
pub mod validate_admin;
pub mod validate_tenant;

pub use auth::session_auth_middleware;
pub use response::error_detail_middleware;
pub use validate_admin::admin_gate_middleware;
pub use validate_tenant::{validate_tenant_middleware, CurrentTenant};
