//! Listening / dialing endpoints.

use super::RpcError;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Network kind, named the way the command line spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// TCP over whichever address family the address resolves to.
    Tcp,
    /// TCP over IPv4 only.
    Tcp4,
    /// TCP over IPv6 only.
    Tcp6,
    /// Unix-domain stream socket.
    Unix,
}

impl Network {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tcp4 => "tcp4",
            Self::Tcp6 => "tcp6",
            Self::Unix => "unix",
        }
    }

    #[must_use]
    pub fn is_tcp(self) -> bool {
        !matches!(self, Self::Unix)
    }

    fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            Self::Tcp => true,
            Self::Tcp4 => addr.is_ipv4(),
            Self::Tcp6 => addr.is_ipv6(),
            Self::Unix => false,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "tcp4" => Ok(Self::Tcp4),
            "tcp6" => Ok(Self::Tcp6),
            #[cfg(unix)]
            "unix" => Ok(Self::Unix),
            _ => Err(RpcError::UnsupportedNetwork(s.to_string())),
        }
    }
}

/// Where the server listens or the client dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp {
        network: Network,
        address: String,
        port: u16,
    },
    /// Socket path. The port has no meaning here.
    Unix { path: PathBuf },
}

impl Endpoint {
    /// Builds an endpoint from the `network`/`address`/`port` triple.
    ///
    /// For [`Network::Unix`] the address is the socket path.
    #[must_use]
    pub fn new(network: Network, address: impl Into<String>, port: u16) -> Self {
        let address = address.into();
        match network {
            Network::Unix => Self::Unix {
                path: PathBuf::from(address),
            },
            network => Self::Tcp {
                network,
                address,
                port,
            },
        }
    }

    #[must_use]
    pub fn network(&self) -> Network {
        match self {
            Self::Tcp { network, .. } => *network,
            Self::Unix { .. } => Network::Unix,
        }
    }

    /// Resolves a TCP endpoint to the first address matching its family.
    pub(crate) async fn resolve(&self) -> Result<SocketAddr, RpcError> {
        let Self::Tcp {
            network,
            address,
            port,
        } = self
        else {
            return Err(RpcError::Resolve {
                endpoint: self.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a TCP endpoint"),
            });
        };

        let resolve_err = |source| RpcError::Resolve {
            endpoint: self.to_string(),
            source,
        };
        let mut candidates = tokio::net::lookup_host((address.as_str(), *port))
            .await
            .map_err(resolve_err)?;
        candidates.find(|a| network.accepts(a)).ok_or_else(|| {
            resolve_err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {network} address for '{address}'"),
            ))
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp {
                network,
                address,
                port,
            } if address.contains(':') => write!(f, "[{address}]:{port} ({network})"),
            Self::Tcp {
                network,
                address,
                port,
            } => write!(f, "{address}:{port} ({network})"),
            Self::Unix { path } => write!(f, "{} (unix)", path.display()),
        }
    }
}
