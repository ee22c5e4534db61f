pub mod bus;
pub mod context;
pub mod node;
