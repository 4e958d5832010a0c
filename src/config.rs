use std::net::SocketAddr;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::cmd::SketchParameters;

pub const DEFAULT_SEARCH_URL: &str = "https://mastiff.sourmash.bio/search";

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Uploads larger than this are rejected before sketching.
pub const DEFAULT_MAX_UPLOAD: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RelayConfig {
    #[builder(default = default_bind())]
    bind: SocketAddr,

    #[builder(default = DEFAULT_SEARCH_URL.into(), setter(into))]
    search_url: String,

    #[builder(default = DEFAULT_MAX_UPLOAD)]
    max_upload: usize,

    /// Outbound request timeout. None waits as long as the remote does.
    #[builder(default)]
    timeout: Option<Duration>,

    #[builder(default)]
    sketch: SketchParameters,
}

fn default_bind() -> SocketAddr {
    // constant address, always parses
    DEFAULT_BIND
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000)))
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RelayConfig {
    pub fn bind(&self) -> SocketAddr {
        self.bind
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn max_upload(&self) -> usize {
        self.max_upload
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn sketch(&self) -> &SketchParameters {
        &self.sketch
    }
}
