//! Nameserver address parsing
//!
//! Accepted forms: `host`, `host:port`, `a.b.c.d[:port]`, a bare IPv6
//! literal, and `[ipv6]` / `[ipv6]:port`. Hostnames are kept as-is and
//! resolved on every send, so a nameserver whose address changes is
//! picked up without rebuilding the provider.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use zonesync_core::{Error, Result};

/// Port used when the address carries none
pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nameserver {
    host: String,
    port: u16,
}

impl Nameserver {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::config("RFC2136 nameserver cannot be empty"));
        }

        if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| Error::config(format!("Unterminated IPv6 literal: {input}")))?;
            host.parse::<std::net::Ipv6Addr>()
                .map_err(|_| Error::config(format!("Invalid IPv6 literal: {host}")))?;

            let port = match tail {
                "" => DEFAULT_DNS_PORT,
                _ => match tail.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => return Err(Error::config(format!("Invalid nameserver: {input}"))),
                },
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        // Several colons without brackets can only be a bare IPv6 address
        if input.parse::<IpAddr>().is_ok() {
            return Ok(Self {
                host: input.to_string(),
                port: DEFAULT_DNS_PORT,
            });
        }

        match input.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => Ok(Self {
                host: host.to_string(),
                port: parse_port(port)?,
            }),
            Some(_) => Err(Error::config(format!("Invalid nameserver: {input}"))),
            None => Ok(Self {
                host: input.to_string(),
                port: DEFAULT_DNS_PORT,
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to a socket address
    pub async fn resolve(&self) -> Result<SocketAddr> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| Error::transport("rfc2136", format!("Cannot resolve {}: {}", self.host, e)))?
            .next()
            .ok_or_else(|| Error::transport("rfc2136", format!("No address for {}", self.host)))
    }
}

impl fmt::Display for Nameserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| Error::config(format!("Invalid nameserver port: {port}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        let ns = Nameserver::parse("ns1.example.com").unwrap();
        assert_eq!(ns.host(), "ns1.example.com");
        assert_eq!(ns.port(), 53);

        let ns = Nameserver::parse("192.0.2.53").unwrap();
        assert_eq!(ns.port(), 53);
    }

    #[test]
    fn test_explicit_port() {
        let ns = Nameserver::parse("192.0.2.53:5353").unwrap();
        assert_eq!(ns.host(), "192.0.2.53");
        assert_eq!(ns.port(), 5353);
    }

    #[test]
    fn test_ipv6_forms() {
        let ns = Nameserver::parse("[2001:db8::53]:5353").unwrap();
        assert_eq!(ns.host(), "2001:db8::53");
        assert_eq!(ns.port(), 5353);

        let ns = Nameserver::parse("[2001:db8::53]").unwrap();
        assert_eq!(ns.port(), 53);

        let ns = Nameserver::parse("2001:db8::53").unwrap();
        assert_eq!(ns.host(), "2001:db8::53");
        assert_eq!(ns.port(), 53);
        assert_eq!(ns.to_string(), "[2001:db8::53]:53");
    }

    #[test]
    fn test_invalid_forms() {
        assert!(Nameserver::parse("").is_err());
        assert!(Nameserver::parse("ns1.example.com:dns").is_err());
        assert!(Nameserver::parse("ns1.example.com:0").is_err());
        assert!(Nameserver::parse("[2001:db8::53").is_err());
        assert!(Nameserver::parse("[not-an-ip]:53").is_err());
        assert!(Nameserver::parse(":53").is_err());
    }

    #[tokio::test]
    async fn test_resolve_ip_literal_without_lookup() {
        let addr = Nameserver::parse("[::1]:5300").unwrap().resolve().await.unwrap();
        assert_eq!(addr, "[::1]:5300".parse::<SocketAddr>().unwrap());
    }
}
