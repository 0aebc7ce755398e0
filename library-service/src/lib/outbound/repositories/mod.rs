pub mod borrow_request;
pub mod user;

pub use borrow_request::PostgresBorrowRequestRepository;
pub use user::PostgresUserRepository;
