mod scheduler;

pub use scheduler::{JobError, JobScheduler};
