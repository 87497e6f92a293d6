//! Bounded-time RADIUS client.
//!
//! One call sends one Access-Request datagram and waits for an authentic
//! reply until the deadline. Replies with the wrong identifier or a bad
//! Response Authenticator are dropped. There is no retransmission; retry
//! policy belongs to the caller. The socket lives inside the deadline
//! future, so it is closed as soon as the deadline fires.

use std::net::SocketAddr;
use std::time::Duration;

use rand::Rng;
use tokio::net::{UdpSocket, lookup_host};
use tracing::{debug, warn};

use crate::config::RadiusConfig;
use crate::error::RadiusError;
use crate::packet::{self, Code, MAX_PACKET_LEN, Packet};

/// RADIUS authentication client.
#[derive(Debug, Clone)]
pub struct RadiusClient {
    config: RadiusConfig,
}

impl RadiusClient {
    pub fn new(config: RadiusConfig) -> Self {
        Self { config }
    }

    /// Verify `username`/`password` with the server.
    ///
    /// Returns the username on Access-Accept. Access-Reject yields
    /// [`RadiusError::AccessRejected`], any other code
    /// [`RadiusError::UnsupportedResponse`], and no authentic reply within
    /// `timeout_secs` yields [`RadiusError::Timeout`].
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, RadiusError> {
        let secret = self.config.shared_secret.as_bytes();
        let (identifier, authenticator) = {
            let mut rng = rand::rng();
            (rng.random::<u8>(), rng.random::<[u8; packet::AUTHENTICATOR_LEN]>())
        };
        let request = Packet::access_request(identifier, authenticator, secret, username, password)?;

        let secs = self.config.timeout_secs;
        let response = match tokio::time::timeout(
            Duration::from_secs(secs),
            self.exchange(&request),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(server = %self.config.server, timeout_secs = secs, "RADIUS exchange timed out");
                return Err(RadiusError::Timeout { secs });
            }
        };

        match response.code {
            Code::AccessAccept => {
                debug!(server = %self.config.server, "RADIUS Access-Accept");
                Ok(username.to_string())
            }
            Code::AccessReject => {
                debug!(server = %self.config.server, "RADIUS Access-Reject");
                Err(RadiusError::AccessRejected)
            }
            other => {
                let code = u8::from(other);
                warn!(server = %self.config.server, code, "Unsupported RADIUS response");
                Err(RadiusError::UnsupportedResponse { code })
            }
        }
    }

    async fn resolve(&self) -> Result<SocketAddr, RadiusError> {
        lookup_host(self.config.server.as_str())
            .await
            .map_err(|e| RadiusError::Address(format!("{}: {e}", self.config.server)))?
            .next()
            .ok_or_else(|| RadiusError::Address(self.config.server.clone()))
    }

    async fn exchange(&self, request: &Packet) -> Result<Packet, RadiusError> {
        let server = self.resolve().await?;
        let local: SocketAddr = if server.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        socket.send(&request.encode()?).await?;
        debug!(%server, identifier = request.identifier, "Sent RADIUS Access-Request");

        let secret = self.config.shared_secret.as_bytes();
        let mut buf = vec![0u8; MAX_PACKET_LEN];
        loop {
            let len = socket.recv(&mut buf).await?;
            let raw = &buf[..len];
            if !packet::verify_response(raw, request.identifier, &request.authenticator, secret) {
                debug!(%server, len, "Dropping unauthenticated RADIUS reply");
                continue;
            }
            match Packet::decode(raw) {
                Ok(response) => return Ok(response),
                Err(e) => debug!(%server, error = %e, "Dropping malformed RADIUS reply"),
            }
        }
    }
}

/// One-shot convenience wrapper around [`RadiusClient::authenticate`].
pub async fn authenticate(
    server: &str,
    shared_secret: &str,
    username: &str,
    password: &str,
    timeout_secs: u64,
) -> Result<String, RadiusError> {
    RadiusClient::new(RadiusConfig {
        server: server.to_string(),
        shared_secret: shared_secret.to_string(),
        timeout_secs,
    })
    .authenticate(username, password)
    .await
}
