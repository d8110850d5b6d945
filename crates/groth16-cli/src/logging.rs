//! Subscriber setup shared by the binaries.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level selected by a `-v` count
pub fn verbosity_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install a fmt subscriber on stderr.
///
/// `RUST_LOG` wins when set; otherwise the workspace crates log at the
/// level picked by `verbosity` and everything else at `warn`.
pub fn init_tracing(verbosity: u8) {
    let level = verbosity_level(verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder().parse_lossy(format!(
            "warn,groth16_cli={level},benchmark_runner={level},groth16_core={level},groth16_setup={level},groth16_witness={level},groth16_r1cs={level}"
        ))
    });
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
