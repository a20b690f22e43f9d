use env_logger::Env;

/// Initialise logging. `RUST_LOG` wins; otherwise `-v` raises the level
/// from warn to info, `-vv` to debug.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
