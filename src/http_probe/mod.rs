pub mod probe;
pub mod result;

pub mod prelude {
    pub use super::probe::probe_url;
    pub use super::result::ProbeResult;
}

use std::fmt::Write;

/// Render an error together with its whole `source()` chain.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}
