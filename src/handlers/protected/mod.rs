// handlers/protected/mod.rs - Protected handlers (session required)
//
// `me` only needs a verified identity provider session. Everything else
// also needs the caller's tenant, resolved from the session organization by
// `validate_tenant_middleware` and read here as `Extension<CurrentTenant>`.
// Every repository call passes that tenant's id; request bodies never name
// a tenant.
//
// Middleware: session_auth_middleware (+ validate_tenant_middleware)

pub mod billing; // Billing portal and connected account
pub mod integrations; // Connected integrations
pub mod me; // Session echo
pub mod overrides; // Date-specific availability
pub mod services; // Bookable services, within plan limits
pub mod upload; // Media uploads
pub mod usage; // Plan limits and usage
