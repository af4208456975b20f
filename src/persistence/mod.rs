pub mod autosave;
pub mod rows;
pub mod store;
