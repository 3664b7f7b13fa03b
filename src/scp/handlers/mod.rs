pub mod pull_ops;
pub mod push_ops;
