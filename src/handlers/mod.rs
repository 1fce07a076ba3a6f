// handlers/mod.rs - Three-tier handler layout
//
// Public (no auth) → Protected (identity provider session, tenant resolved
// where needed) → Elevated (admin gate)

pub mod elevated; // Admin gate (/api/admin/*, /api/plans/debug)
pub mod protected; // Session required (/api/me, tenant-scoped routes)
pub mod public; // No authentication
