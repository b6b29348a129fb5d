pub mod colors;
pub mod graph;
pub mod layered;
pub mod layout;
