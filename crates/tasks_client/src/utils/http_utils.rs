use anyhow::{anyhow, Result};
use bot_core::config::{Config, ProxyAuth};
use log::{error, info};
use reqwest::{Client, Proxy, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

fn apply_proxy_auth(proxy: Proxy, auth: Option<&ProxyAuth>) -> Proxy {
    let Some(auth) = auth else {
        return proxy;
    };
    if auth.username.is_empty() {
        return proxy;
    }
    proxy.basic_auth(&auth.username, &auth.password)
}

/// Base reqwest client honoring the configured proxies and request timeout.
pub fn build_http_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder().timeout(config.request_timeout());
    if !config.http_proxy.is_empty() {
        let mut proxy = Proxy::http(&config.http_proxy)?;
        proxy = apply_proxy_auth(proxy, config.http_proxy_auth.as_ref());
        builder = builder.proxy(proxy);
    }
    if !config.https_proxy.is_empty() {
        let mut proxy = Proxy::https(&config.https_proxy)?;
        proxy = apply_proxy_auth(proxy, config.https_proxy_auth.as_ref());
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(|e| anyhow!("Failed to build HTTP client: {e}"))
}

/// Client without middleware; task API calls are never retried.
pub fn build_plain_client(client: Client) -> ClientWithMiddleware {
    ClientBuilder::new(client).build()
}

/// Client for the OAuth token endpoint, retrying transient failures.
pub fn build_retry_client(client: Client) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

/// Send a prepared request, logging method, target and outcome. Headers are not logged.
pub async fn execute_request(
    request_builder: RequestBuilder,
    label: &str,
) -> std::result::Result<Response, reqwest_middleware::Error> {
    info!("Sending {} request", label);
    let start_time = std::time::Instant::now();

    match request_builder.send().await {
        Ok(resp) => {
            info!(
                "{} answered after {:?} with status {}",
                label,
                start_time.elapsed(),
                resp.status()
            );
            Ok(resp)
        }
        Err(e) => {
            error!("{} failed after {:?}: {}", label, start_time.elapsed(), e);
            if let reqwest_middleware::Error::Reqwest(inner) = &e {
                if inner.is_timeout() {
                    error!("Request timed out");
                }
                if inner.is_connect() {
                    error!("Connection error");
                }
            }
            Err(e)
        }
    }
}
