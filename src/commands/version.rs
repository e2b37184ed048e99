use tracing::debug;

const UNKNOWN: &str = "unknown";

pub fn run() {
    debug!("executing version command");
    println!("{}", build_version());
}

/// `v<version>-<commit> <os>/<arch>  BuildDate: <date>  Vendor: <vendor>`
///
/// Commit, date and vendor are taken from `CRDA_BUILD_COMMIT`,
/// `CRDA_BUILD_DATE` and `CRDA_BUILD_VENDOR` at compile time.
pub fn build_version() -> String {
    format!(
        "v{}-{} {}/{}  BuildDate: {}  Vendor: {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("CRDA_BUILD_COMMIT").unwrap_or(UNKNOWN),
        std::env::consts::OS,
        std::env::consts::ARCH,
        option_env!("CRDA_BUILD_DATE").unwrap_or(UNKNOWN),
        option_env!("CRDA_BUILD_VENDOR").unwrap_or("Local Build"),
    )
}
