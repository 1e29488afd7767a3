pub mod command;
pub mod edit;
pub mod info;
