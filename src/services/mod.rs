pub mod availability;
pub mod roadmap;
pub mod upload;
pub mod usage;
pub mod validation;
