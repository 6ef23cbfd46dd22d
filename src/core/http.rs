use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, ClientBuilder};

pub const APP_USER_AGENT: &str = concat!("wurm-launcher/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest silence tolerated between two reads of a response body.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    client_builder(READ_TIMEOUT).build()
}

fn client_builder(read_timeout: Duration) -> ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(read_timeout)
}
