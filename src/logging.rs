use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` turns on `patlak=debug`
/// and the default is `patlak=error` (load warnings reach the user as
/// diagnostics). Safe to call more than once.
pub fn init_logging(debug: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else if debug {
            EnvFilter::new("patlak=debug")
        } else {
            EnvFilter::new("patlak=error")
        };

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(debug)
                    .with_level(true),
            )
            .with(filter)
            .try_init();
    });
}
