pub mod health;
pub mod macros;
