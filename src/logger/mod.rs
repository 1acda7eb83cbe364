// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use tracing_subscriber::{EnvFilter, prelude::*};

/// Installs a global subscriber that writes through the test harness's
/// captured output. `RUST_LOG` overrides the default `info` filter. Safe to
/// call from every test; only the first call installs anything.
pub fn setup_test_logger() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::Layer::new()
                .with_test_writer()
                .with_filter(get_env_filter(default_env_filter())),
        )
        .try_init();
}

fn get_env_filter(def: EnvFilter) -> EnvFilter {
    use std::env::{
        self,
        VarError::{NotPresent, NotUnicode},
    };
    match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(s) => EnvFilter::new(s),
        Err(NotPresent) => def,
        Err(NotUnicode(_)) => EnvFilter::default(),
    }
}

fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_idempotent() {
        setup_test_logger();
        setup_test_logger();
        tracing::info!("logger installed");
    }
}
