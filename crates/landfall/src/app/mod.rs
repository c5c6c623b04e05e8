mod loop_runner;

pub use loop_runner::{run_client, ClientError};
