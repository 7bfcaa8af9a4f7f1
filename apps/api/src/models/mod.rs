pub mod email;
pub mod rating;
pub mod usage;
pub mod user;
