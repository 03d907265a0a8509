pub mod layout;
pub mod publish;
pub mod retention;
