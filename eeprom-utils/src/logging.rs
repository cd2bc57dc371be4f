use std::env;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr. `RUST_LOG` overrides the default filter.
pub fn init() {
    let default_filter = if cfg!(debug_assertions) {
        "eeprom_core=debug,eeprom_utils=debug"
    } else {
        "eeprom_core=info,eeprom_utils=info"
    }
    .parse::<Targets>()
    .unwrap_or_default();
    let filter = match env::var("RUST_LOG") {
        Ok(filter) => filter.parse::<Targets>().unwrap_or(default_filter),
        Err(_) => default_filter,
    };

    let registry = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .compact()
            .with_line_number(true)
            .with_writer(std::io::stderr),
    );
    if let Err(err) = registry.try_init() {
        eprintln!("setting tracing default failed: {err:?}");
    }
}
