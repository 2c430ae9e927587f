pub mod builder;
pub mod evaluate;
pub mod flow;
pub mod types;
