use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "off"
    } else if verbose {
        "warn,chatloop=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Logs always go to stderr so stdout carries
/// nothing but the conversation. `--quiet` wins over `RUST_LOG`.
pub fn init(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::default_filter;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(default_filter(true, true), "off");
        assert_eq!(default_filter(true, false), "warn,chatloop=debug");
        assert_eq!(default_filter(false, false), "warn");
    }
}
