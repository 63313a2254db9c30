pub mod aggregate;
pub mod dictionary;
pub mod rank;
