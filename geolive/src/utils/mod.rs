//! Shared helpers.

pub mod fs;
pub mod http_client;

#[cfg(test)]
pub(crate) mod test_server;
