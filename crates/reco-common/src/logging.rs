//! プロセス全体のログ設定。
//!
//! 出力先は `RECO_LOG_DIR` があれば `<dir>/<app>.log`（日次ローテーション）、
//! なければ標準出力。フィルタは `RUST_LOG`（既定 `info`）。

use std::env;
use std::panic::{self, PanicHookInfo};
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_DIR_ENV: &str = "RECO_LOG_DIR";
const BACKTRACE_ENV: &str = "RECO_LOG_INCLUDE_BACKTRACE";

// non_blocking writer はガードが生きている間だけ flush される
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static PANIC_HOOK: OnceLock<()> = OnceLock::new();

fn flag_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if v == "1" || v.eq_ignore_ascii_case("true"))
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// panic を `tracing::error!` に流す。2 回目以降の呼び出しは何もしない
pub fn install_tracing_panic_hook(app_name: &'static str) {
    PANIC_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        let passthrough = flag_enabled(env::var(BACKTRACE_ENV).ok().as_deref());

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());

            tracing::error!(
                application = app_name,
                thread = std::thread::current().name().unwrap_or("unnamed"),
                %location,
                message = %panic_message(info),
                "panic"
            );

            if passthrough {
                previous(info);
            }
        }));
    });
}

fn file_writer(app_name: &str) -> Option<BoxMakeWriter> {
    let dir = PathBuf::from(env::var_os(LOG_DIR_ENV)?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("{LOG_DIR_ENV}={} is not usable ({err}); logging to stdout", dir.display());
        return None;
    }

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, format!("{app_name}.log")));
    FILE_GUARD.set(guard).ok()?;
    Some(BoxMakeWriter::new(writer))
}

/// グローバル subscriber を初期化する。既に設定済みなら黙って何もしない
pub fn init_tracing_subscriber(app_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match file_writer(app_name) {
        Some(writer) => subscriber.with_writer(writer).try_init(),
        None => subscriber.try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(application = app_name, "tracing initialized");
    }
}
