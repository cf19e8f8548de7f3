pub mod auth;
pub mod dreams;
pub mod engagement;
pub mod feed;
pub mod relationship;
pub mod users;
