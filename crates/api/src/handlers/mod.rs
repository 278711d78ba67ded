pub mod events;
pub mod macros;
