pub mod dream;
pub mod engagement;
pub mod social_graph;
pub mod user;
