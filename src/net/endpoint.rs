//! Listen URL parsing.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};

use thiserror::Error;
use url::{Host, Url};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenUrlError {
    #[error("invalid listen url '{url}': {reason}")]
    Invalid { url: String, reason: String },

    #[error("unsupported scheme '{scheme}' in listen url '{url}', expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("listen url '{url}' has no host")]
    MissingHost { url: String },

    #[error("cannot resolve host of listen url '{url}'")]
    Unresolved { url: String },
}

/// One address to listen on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenUrl {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

impl ListenUrl {
    pub fn parse(raw: &str) -> Result<Self, ListenUrlError> {
        let url = Url::parse(raw.trim()).map_err(|e| ListenUrlError::Invalid {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let use_tls = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(ListenUrlError::UnsupportedScheme {
                    url: raw.to_string(),
                    scheme: other.to_string(),
                })
            }
        };

        let host = match url.host() {
            Some(Host::Domain(domain)) if domain.eq_ignore_ascii_case("localhost") => {
                Ipv4Addr::LOCALHOST.to_string()
            }
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => {
                return Err(ListenUrlError::MissingHost {
                    url: raw.to_string(),
                })
            }
        };

        let port = url
            .port_or_known_default()
            .unwrap_or(if use_tls { 443 } else { 80 });

        Ok(Self {
            host,
            port,
            use_tls,
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Socket address to bind. Host names are resolved once.
    pub fn socket_addr(&self) -> Result<SocketAddr, ListenUrlError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ListenUrlError::Unresolved {
                url: self.to_string(),
            })
    }
}

impl fmt::Display for ListenUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme(), self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme(), self.host, self.port)
        }
    }
}

/// Parse every URL, keeping first occurrences only.
pub fn parse_listen_urls<S: AsRef<str>>(urls: &[S]) -> Result<Vec<ListenUrl>, ListenUrlError> {
    let mut parsed: Vec<ListenUrl> = Vec::with_capacity(urls.len());
    for url in urls {
        let url = ListenUrl::parse(url.as_ref())?;
        if !parsed.contains(&url) {
            parsed.push(url);
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_and_default_ports() {
        let http = ListenUrl::parse("http://localhost").unwrap();
        assert_eq!(http.host, "127.0.0.1");
        assert_eq!(http.port, 80);
        assert!(!http.use_tls);

        let https = ListenUrl::parse("https://0.0.0.0").unwrap();
        assert_eq!(https.port, 443);
        assert!(https.use_tls);

        let custom = ListenUrl::parse("http://localhost:9090").unwrap();
        assert_eq!(custom.socket_addr().unwrap(), "127.0.0.1:9090".parse().unwrap());
    }

    #[test]
    fn test_ipv6() {
        let url = ListenUrl::parse("http://[::1]:8080").unwrap();
        assert_eq!(url.host, "::1");
        assert_eq!(url.to_string(), "http://[::1]:8080");
        assert_eq!(url.socket_addr().unwrap(), "[::1]:8080".parse().unwrap());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            ListenUrl::parse("ftp://localhost:21"),
            Err(ListenUrlError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            ListenUrl::parse("not a url"),
            Err(ListenUrlError::Invalid { .. })
        ));
    }

    #[test]
    fn test_duplicates_removed() {
        let urls = parse_listen_urls(&[
            "http://localhost:9090",
            "http://127.0.0.1:9090",
            "https://localhost:9443",
        ])
        .unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].to_string(), "http://127.0.0.1:9090");
    }
}
