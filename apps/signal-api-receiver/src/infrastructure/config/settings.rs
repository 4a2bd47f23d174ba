//! Receiver Configuration Settings
//!
//! Configuration types for the receiver, built from command-line flags
//! (with environment fallbacks, see [`ReceiverArgs`](super::ReceiverArgs)).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio_tungstenite::tungstenite::http::Uri;

use crate::application::services::ReconnectConfig;
use crate::domain::filter::AcceptPolicy;
use crate::domain::message::EnvelopeKind;

/// Default listen address, in the `:port` shorthand.
pub const DEFAULT_LISTEN_ADDR: &str = ":8105";

/// Complete receiver configuration.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Address the HTTP server listens on.
    pub listen_addr: SocketAddr,
    /// Fully qualified WebSocket endpoint, `<scheme>://<host>/v1/receive/<account>`.
    pub endpoint: String,
    /// Signal account number.
    pub account: String,
    /// Reconnection settings.
    pub reconnect: ReconnectConfig,
    /// Which envelopes are buffered.
    pub accept: AcceptPolicy,
}

impl ReceiverConfig {
    /// Build a configuration from raw setting values.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL, account, listen address or accepted
    /// kinds are invalid.
    pub fn new(
        listen_addr: &str,
        signal_api_url: &str,
        signal_account: &str,
        reconnect_delay: Duration,
        accept_kinds: &[String],
        allow_empty_data: bool,
    ) -> Result<Self, ConfigError> {
        if signal_account.trim().is_empty() {
            return Err(ConfigError::EmptyValue("signal-account".to_string()));
        }

        Ok(Self {
            listen_addr: parse_listen_addr(listen_addr)?,
            endpoint: receive_endpoint(signal_api_url, signal_account)?,
            account: signal_account.to_string(),
            reconnect: ReconnectConfig::new(reconnect_delay),
            accept: parse_accept_policy(accept_kinds, !allow_empty_data)?,
        })
    }
}

/// Build the receive endpoint for `account` on the API at `api_url`.
///
/// The path of `api_url` is replaced with `/v1/receive/<account>`, with the
/// account percent-encoded; any query string is kept.
///
/// # Errors
///
/// Returns an error if the URL does not parse, lacks a scheme or host, or
/// uses a scheme other than `ws`/`wss`.
pub fn receive_endpoint(api_url: &str, account: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: api_url.to_string(),
        reason,
    };

    let uri: Uri = api_url.trim().parse().map_err(|e| invalid(format!("{e}")))?;

    let scheme = uri
        .scheme_str()
        .ok_or_else(|| ConfigError::MissingScheme(api_url.to_string()))?;
    if !matches!(scheme, "ws" | "wss") {
        return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
    }

    let authority = uri
        .authority()
        .filter(|authority| !authority.host().is_empty())
        .ok_or_else(|| ConfigError::MissingHost(api_url.to_string()))?;

    let path = format!("/v1/receive/{}", encode_path_segment(account));
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    let endpoint = Uri::builder()
        .scheme(scheme)
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| invalid(format!("{e}")))?;

    Ok(endpoint.to_string())
}

/// Percent-encode an account for use as one path segment, keeping the
/// leading `+` of E.164 numbers readable.
fn encode_path_segment(segment: &str) -> String {
    segment
        .split('+')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("+")
}

/// Parse a listen address, accepting the `:port` shorthand for all
/// interfaces.
///
/// # Errors
///
/// Returns `ConfigError::InvalidListenAddr` if the address does not parse.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    let addr = addr.trim();
    if let Some(port) = addr.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(addr.to_string()))?;
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }

    addr.parse()
        .map_err(|_| ConfigError::InvalidListenAddr(addr.to_string()))
}

/// Parse the accepted kind names into a policy.
///
/// # Errors
///
/// Returns `ConfigError::UnknownEnvelopeKind` for an unrecognized name and
/// `ConfigError::EmptyValue` if no kind is given.
pub fn parse_accept_policy(kinds: &[String], require_text: bool) -> Result<AcceptPolicy, ConfigError> {
    let parsed = kinds
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| EnvelopeKind::parse(name).ok_or_else(|| ConfigError::UnknownEnvelopeKind(name.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    if parsed.is_empty() {
        return Err(ConfigError::EmptyValue("accept".to_string()));
    }

    Ok(AcceptPolicy::new(parsed, require_text))
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Setting has an empty value.
    #[error("{0} cannot be empty")]
    EmptyValue(String),

    /// The Signal API URL does not parse.
    #[error("error parsing the url {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Parser error.
        reason: String,
    },

    /// The Signal API URL has no scheme.
    #[error("the given url {0:?} does not contain a scheme")]
    MissingScheme(String),

    /// The Signal API URL has no host.
    #[error("the given url {0:?} does not contain a host")]
    MissingHost(String),

    /// The Signal API URL is not a WebSocket URL.
    #[error("unsupported scheme {0:?}, expected ws or wss")]
    UnsupportedScheme(String),

    /// The listen address does not parse.
    #[error("invalid listen address {0:?}")]
    InvalidListenAddr(String),

    /// Unknown envelope kind in the accept list.
    #[error("unknown envelope kind {0:?}, expected one of data, typing, receipt, sync, other")]
    UnknownEnvelopeKind(String),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("wss://signal-api.example.com", "+15550000000", "wss://signal-api.example.com/v1/receive/+15550000000" ; "host only")]
    #[test_case("ws://localhost:8080", "+1", "ws://localhost:8080/v1/receive/+1" ; "with port")]
    #[test_case("wss://api.example.com/some/prefix", "+1", "wss://api.example.com/v1/receive/+1" ; "path replaced")]
    #[test_case("wss://api.example.com/?token=abc", "+1", "wss://api.example.com/v1/receive/+1?token=abc" ; "query kept")]
    fn endpoint_is_computed(url: &str, account: &str, expected: &str) {
        assert_eq!(receive_endpoint(url, account).unwrap(), expected);
    }

    #[test_case("+1 555", "/v1/receive/+1%20555" ; "space")]
    #[test_case("+1#2", "/v1/receive/+1%232" ; "fragment marker")]
    #[test_case("a/b?c", "/v1/receive/a%2Fb%3Fc" ; "path and query markers")]
    fn endpoint_escapes_account(account: &str, expected_path: &str) {
        let endpoint = receive_endpoint("wss://api.example.com/?token=abc", account).unwrap();
        assert_eq!(endpoint, format!("wss://api.example.com{expected_path}?token=abc"));
    }

    #[test]
    fn endpoint_requires_scheme() {
        let err = receive_endpoint("signal-api.example.com", "+1").unwrap_err();
        assert!(matches!(err, ConfigError::MissingScheme(_)), "got {err:?}");

        let err = receive_endpoint("/v1/receive", "+1").unwrap_err();
        assert!(matches!(err, ConfigError::MissingScheme(_)), "got {err:?}");
    }

    #[test]
    fn endpoint_requires_websocket_scheme() {
        let err = receive_endpoint("https://signal-api.example.com", "+1").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(ref s) if s == "https"), "got {err:?}");
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(receive_endpoint("wss://exa mple.com", "+1").is_err());
        assert!(receive_endpoint("", "+1").is_err());
    }

    #[test]
    fn listen_addr_shorthand() {
        assert_eq!(
            parse_listen_addr(":8105").unwrap(),
            "0.0.0.0:8105".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_listen_addr("127.0.0.1:9000").unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr(":http").is_err());
        assert!(parse_listen_addr("localhost").is_err());
    }

    #[test]
    fn accept_policy_parsing() {
        let policy = parse_accept_policy(&["data".to_string(), " Receipt".to_string()], true).unwrap();
        assert_eq!(policy.kinds(), vec![EnvelopeKind::Data, EnvelopeKind::Receipt]);
        assert!(policy.require_text());

        let err = parse_accept_policy(&["story".to_string()], true).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnvelopeKind(ref k) if k == "story"));

        let err = parse_accept_policy(&[String::new()], true).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(_)));
    }

    #[test]
    fn config_from_values() {
        let config = ReceiverConfig::new(
            ":8105",
            "wss://signal-api.example.com",
            "+15550000000",
            Duration::from_secs(1),
            &["data".to_string()],
            false,
        )
        .unwrap();

        assert_eq!(config.listen_addr.port(), 8105);
        assert_eq!(config.endpoint, "wss://signal-api.example.com/v1/receive/+15550000000");
        assert_eq!(config.reconnect.delay, Duration::from_secs(1));
        assert_eq!(config.accept, AcceptPolicy::default());
    }

    #[test]
    fn config_requires_account() {
        let err = ReceiverConfig::new(
            ":8105",
            "wss://signal-api.example.com",
            "  ",
            Duration::from_secs(1),
            &["data".to_string()],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(_)));
    }
}
