pub mod handlers;
pub mod review;
