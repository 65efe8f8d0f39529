pub mod paths;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "recurring_core=info";

/// Initializes the global tracing subscriber with sensible defaults.
///
/// `extra` is an optional filter directive list (for example from the config
/// file) layered on top of `RUST_LOG`.
pub fn init_tracing(extra: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        let directives = std::iter::once(DEFAULT_DIRECTIVE)
            .chain(extra.into_iter().flat_map(|raw| raw.split(',')))
            .map(str::trim)
            .filter(|raw| !raw.is_empty());
        for raw in directives {
            match raw.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => eprintln!("ignoring log directive `{}`: {}", raw, err),
            }
        }

        // Another subscriber may already be installed by an embedding application.
        let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
    });
}
