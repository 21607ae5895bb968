use env_logger::{Builder, Env, Target};
use std::sync::Mutex;
use std::time::Instant;

/// Global timestamp for delta calculation
static LAST_LOG: Mutex<Option<Instant>> = Mutex::new(None);

/// Initialize the logger with delta timestamps
///
/// Defaults to `info`; `RUST_LOG=debug` shows every macro as it fires.
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .format(|buf, record| {
            use std::io::Write;

            let now = Instant::now();
            let delta = match LAST_LOG.lock() {
                Ok(mut last) => {
                    let delta = last.map(|t| now.duration_since(t).as_millis()).unwrap_or(0);
                    *last = Some(now);
                    delta
                }
                Err(_) => 0,
            };

            writeln!(
                buf,
                "{} [+{} ms] [{}] - {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                delta,
                record.level(),
                record.args()
            )
        })
        .init();
}
