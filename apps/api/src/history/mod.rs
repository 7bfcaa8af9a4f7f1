// Generated-email history and feedback ratings.

pub mod handlers;
