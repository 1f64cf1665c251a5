pub mod jobs;
pub mod notify;
pub mod serve;
pub mod token;
pub mod watch;
