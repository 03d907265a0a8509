pub mod content;
pub mod contract;
pub mod recommendation;
