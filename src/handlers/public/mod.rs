// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Pricing, public booking pages, the public roadmap, slot availability and
// the signup email check. Every input comes from an anonymous caller.
//
// Middleware: none beyond the global layers

pub mod business; // Booking pages by tenant slug
pub mod calendar; // Bookable slots
pub mod plans; // Pricing page
pub mod roadmap; // Public roadmap and voting
pub mod signup; // Email availability
