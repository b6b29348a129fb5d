pub mod coordinator;
pub mod filters;
pub mod state;
