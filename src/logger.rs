//! Logger initialization.

use log::LevelFilter;
use std::io::Write;

/// Initializes `env_logger`. `RUST_LOG` is read first and `level` overrides
/// it; HTTP internals are capped at `info`. Calling it twice is harmless.
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info.min(level));
    builder.filter_module("hyper", LevelFilter::Info.min(level));
    builder.filter_module("source_mirror", level);

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        )
    });

    builder.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails_without_panicking() {
        let _ = init_logger(LevelFilter::Debug);
        assert!(init_logger(LevelFilter::Info).is_err());
    }
}
