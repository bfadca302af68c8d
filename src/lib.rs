//! Load probe for a single HTTP resource.
//!
//! A scenario (target URL, headers, virtual users, iterations or duration and
//! the expected status) is loaded and validated by [`config`], executed by
//! [`runner`] with one tokio task per virtual user, and every request is
//! checked by [`http_probe`]. [`app`] ties them together into an exit code.
pub mod app;
pub mod config;
pub mod http_probe;
pub mod runner;

#[cfg(test)]
mod test_server;
