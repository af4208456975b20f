pub mod position;
pub mod sim;
