/// Address the server binds to when `--host` is not given.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default `RUST_LOG` directive for the server binary.
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";
