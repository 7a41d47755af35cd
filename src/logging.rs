use console::style;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Debug output for this crate with `--debug`, info otherwise. Dependencies
/// only log warnings unless `RUST_LOG` says more.
pub fn setup_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            let name = style(env!("CARGO_PKG_NAME")).cyan();
            match record.level() {
                Level::Error | Level::Warn => {
                    let level = if record.level() == Level::Error {
                        style("ERROR").red()
                    } else {
                        style("WARN").yellow()
                    };
                    writeln!(buf, "[{name} {level} {}] {}", record.target(), record.args())
                }
                Level::Debug | Level::Trace => {
                    writeln!(buf, "[{name} {}] {}", style("DEBUG").dim(), record.args())
                }
                Level::Info => writeln!(buf, "[{name}] {}", record.args()),
            }
        })
        .init();
}
