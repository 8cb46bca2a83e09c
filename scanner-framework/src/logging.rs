use tracing_subscriber::{prelude::*, registry, EnvFilter};

/// Install the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG` when set, otherwise it defaults to `info` with `debug`
/// enabled for the executable's own target.
pub fn init(executable_name: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,{}=debug",
            executable_name.replace('-', "_")
        ))
    });

    let log_default_layer = (!json).then(tracing_subscriber::fmt::layer);
    let log_json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
    });

    registry()
        .with(env_filter)
        .with(log_default_layer)
        .with(log_json_layer)
        .init();
}
