/// Display name used when a sender or directory entry has no usable name ("user")
pub const DEFAULT_USER_NAME: &str = "משתמש";

/// Meeting length in minutes when the proposer leaves it unset
pub const DEFAULT_MEETING_DURATION: &str = "60";

/// Database file name inside the platform data directory
pub const DB_FILE_NAME: &str = "helpchain.db";

/// Default capacity of a subscription's snapshot channel
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 16;
