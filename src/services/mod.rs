pub mod gateway;
pub mod poller;
pub mod workflow;
