pub mod borrow_request;
pub mod errors;
pub mod user;
