/// `--version` string: package version with the git build reference.
pub const FULL: &str = concat!(env!("CARGO_PKG_VERSION"), "+git.", env!("TASKS_BUILD_REF"));
