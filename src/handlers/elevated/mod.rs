// handlers/elevated/mod.rs - Elevated handlers (admin gate required)
//
// Platform administration: plan catalogue and roadmap content. These routes
// are not tenant-scoped; they act on platform-wide tables.
//
// Middleware: admin_gate_middleware (inserts the admitted AdminCredentials)

pub mod plans; // Plan catalogue, ordering, debug listing
pub mod roadmap; // Roadmap content management
