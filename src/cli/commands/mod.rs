pub mod migrate;
pub mod plans;
pub mod seed_roadmap;
