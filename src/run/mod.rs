pub mod executor;
pub mod run_model;
pub mod runner;
pub mod runner_session;
pub mod timing;
