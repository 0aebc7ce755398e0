pub mod issuer;

pub use issuer::TokenIssuer;
