use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

/// Rolling daily log setup for adapter binaries (importers, payroll jobs).
///
/// The returned guard must stay alive for the duration of the process or
/// buffered log lines are dropped.
pub fn init_tracing(log_dir: &str) -> WorkerGuard {
    let file_appender = rolling::daily(log_dir, "engine.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    guard
}
