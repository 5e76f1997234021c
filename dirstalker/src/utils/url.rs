//! # TargetUrl
//!
//! Validation of the base URL every candidate path is appended to.
//!
//! **Rules:**
//! - Only `http://` and `https://` schemes, in any letter case
//! - Optional `user[:password]@` credentials, which are skipped when
//!   validating the host and stay in the base URL
//! - Host must be a DNS name, an IPv4 address or a bracketed IPv6 address
//! - Optional port in `1..=65535`
//!
//! The raw input is kept verbatim in [`TargetUrl::base`]. Candidates are
//! concatenated onto it without inserting or removing separators, so
//! `http://host/` + `admin` probes `/admin` while `http://host/app` +
//! `admin` probes `/appadmin`.
//!
//! ## Example
//!
//! ```rust
//! use dirstalker::utils::TargetUrl;
//!
//! let target: TargetUrl = "http://127.0.0.1:8080/".parse().unwrap();
//! assert_eq!(target.port, 8080);
//! assert_eq!(target.candidate_url("admin"), "http://127.0.0.1:8080/admin");
//! ```
use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};
use thiserror::Error;

/// A validated base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetUrl {
    pub scheme: Scheme,
    pub host: String,
    pub host_kind: HostKind,
    /// 0 when the URL carries no explicit port.
    pub port: u16,
    pub path: String,
    /// The input exactly as given.
    pub base: String,
}

impl Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn prefix(self) -> &'static str {
        match self {
            Self::Http => "http://",
            Self::Https => "https://",
        }
    }

    fn starts(self, input: &str) -> bool {
        let prefix = self.prefix();
        input
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// What kind of host the URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Dns,
    IPv4,
    IPv6,
}

impl Display for HostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dns => write!(f, "dns"),
            Self::IPv4 => write!(f, "ipv4"),
            Self::IPv6 => write!(f, "ipv6"),
        }
    }
}

impl HostKind {
    /// Classifies `host`, trying IPv4, then bracketed IPv6, then DNS.
    ///
    /// DNS names follow the usual label rules: at most 253 characters,
    /// labels of 1 to 63 ASCII alphanumerics or `-`, never starting or
    /// ending with `-`.
    pub fn detect(host: &str) -> Result<HostKind, TargetUrlError> {
        if Ipv4Addr::from_str(host).is_ok() {
            return Ok(HostKind::IPv4);
        }

        if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            return Ipv6Addr::from_str(inner)
                .map(|_| HostKind::IPv6)
                .map_err(|_| TargetUrlError::InvalidHost(host.to_string()));
        }

        let valid = host.len() <= 253
            && host.split('.').all(|label| {
                !label.is_empty()
                    && label.len() <= 63
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            });

        if valid {
            Ok(HostKind::Dns)
        } else {
            Err(TargetUrlError::InvalidHost(host.to_string()))
        }
    }
}

/// Reasons a base URL is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum TargetUrlError {
    #[error("the url is empty")]
    Empty,
    #[error("invalid scheme in {0:?} => expected http:// or https://")]
    InvalidScheme(String),
    #[error("invalid host {0:?} => must be a DNS name, IPv4 or [IPv6]")]
    InvalidHost(String),
    #[error("invalid port {0:?} => (1 -> 65,535)")]
    InvalidPort(String),
}

impl FromStr for TargetUrl {
    type Err = TargetUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetUrl::new(s)
    }
}

impl TryFrom<&str> for TargetUrl {
    type Error = TargetUrlError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        TargetUrl::new(value)
    }
}

impl TargetUrl {
    /// Parses and validates `input`.
    ///
    /// # Errors
    /// Returns [`TargetUrlError`] when the input is empty, uses another
    /// scheme, names an invalid host or carries an unparsable port.
    pub fn new(input: &str) -> Result<TargetUrl, TargetUrlError> {
        if input.is_empty() {
            return Err(TargetUrlError::Empty);
        }

        let scheme = if Scheme::Https.starts(input) {
            Scheme::Https
        } else if Scheme::Http.starts(input) {
            Scheme::Http
        } else {
            return Err(TargetUrlError::InvalidScheme(input.to_string()));
        };

        let rest = &input[scheme.prefix().len()..];
        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, path) = rest.split_at(authority_end);

        let authority = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host_port)| host_port);
        let (host, port) = split_authority(authority)?;
        let host_kind = HostKind::detect(host)?;

        Ok(TargetUrl {
            scheme,
            host: host.to_string(),
            host_kind,
            port,
            path: path.to_string(),
            base: input.to_string(),
        })
    }

    /// The URL probed for `candidate`: the base followed by the candidate.
    pub fn candidate_url(&self, candidate: &str) -> String {
        format!("{}{}", self.base, candidate)
    }
}

fn split_authority(authority: &str) -> Result<(&str, u16), TargetUrlError> {
    let port_sep = if authority.starts_with('[') {
        authority
            .find(']')
            .and_then(|end| authority[end..].find(':').map(|i| end + i))
    } else {
        authority.rfind(':')
    };

    match port_sep {
        None => Ok((authority, 0)),
        Some(i) => {
            let raw = &authority[i + 1..];
            match raw.parse::<u16>() {
                Ok(port) if port > 0 => Ok((&authority[..i], port)),
                _ => Err(TargetUrlError::InvalidPort(raw.to_string())),
            }
        }
    }
}
