pub mod time_shared;
pub mod time_shared_over_subscription;
