use env_logger::Builder;
use std::io::Write;

/// Installs a `log`/`env_logger` subscriber with a compact
/// `[level - target] [file:line] message` format.
///
/// Safe to call more than once; `env_logger` ignores the second `init`.
pub fn init_log() {
    let mut builder = Builder::from_default_env();
    let _ = builder
        .format_timestamp_micros()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} - {}] [{}:{}] {}",
                record.level(),
                record.target(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();
}
