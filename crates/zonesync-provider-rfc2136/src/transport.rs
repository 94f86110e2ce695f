//! Sending update messages to the primary nameserver

use crate::nameserver::Nameserver;
use crate::tsig::TsigKey;
use async_trait::async_trait;
use hickory_client::client::AsyncClient;
use hickory_proto::error::ProtoError;
use hickory_proto::iocompat::AsyncIoTokioAsStd;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::tcp::TcpClientStream;
use hickory_proto::udp::UdpClientStream;
use hickory_proto::xfer::{
    DnsHandle, DnsMultiplexer, DnsRequest, DnsRequestOptions, DnsRequestSender, DnsResponse,
    FirstAnswer,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};
use zonesync_core::config::DnsTransport;
use zonesync_core::{Error, Result};

/// Delivers one update message and checks the answer
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

/// hickory-client backed transport
///
/// Opens a fresh connection per update. When a key is configured the
/// update is TSIG-signed and the answer's signature is checked. The
/// configured timeout bounds connecting and waiting for the answer.
#[derive(Debug, Clone)]
pub struct HickoryTransport {
    nameserver: Nameserver,
    protocol: DnsTransport,
    timeout: Duration,
    tsig: Option<Arc<TsigKey>>,
}

impl HickoryTransport {
    pub fn new(
        nameserver: Nameserver,
        protocol: DnsTransport,
        timeout: Duration,
        tsig: Option<TsigKey>,
    ) -> Self {
        Self {
            nameserver,
            protocol,
            timeout,
            tsig: tsig.map(Arc::new),
        }
    }

    pub fn nameserver(&self) -> &Nameserver {
        &self.nameserver
    }

    pub fn is_signed(&self) -> bool {
        self.tsig.is_some()
    }
}

#[async_trait]
impl UpdateTransport for HickoryTransport {
    async fn send(&self, message: Message) -> Result<()> {
        let addr = self.nameserver.resolve().await?;
        let request = DnsRequest::new(message, DnsRequestOptions::default());

        tracing::debug!(
            "Sending update to {} over {:?} (signed: {})",
            addr,
            self.protocol,
            self.is_signed()
        );

        let response = match self.protocol {
            DnsTransport::Udp => {
                let stream = UdpClientStream::<UdpSocket, TsigKey>::with_timeout_and_signer(
                    addr,
                    self.timeout,
                    self.tsig.clone(),
                );
                exchange(stream, request).await?
            }
            DnsTransport::Tcp => {
                let (stream, handle) =
                    TcpClientStream::<AsyncIoTokioAsStd<TcpStream>>::with_timeout(addr, self.timeout);
                let multiplexer = DnsMultiplexer::<_, TsigKey>::with_timeout(
                    stream,
                    handle,
                    self.timeout,
                    self.tsig.clone(),
                );
                exchange(multiplexer, request).await?
            }
        };

        check_response(response.response_code())
    }
}

/// Connect, send one request and wait for its first answer
async fn exchange<F, S>(connect: F, request: DnsRequest) -> Result<DnsResponse>
where
    F: Future<Output = std::result::Result<S, ProtoError>> + Send + Unpin + 'static,
    S: DnsRequestSender,
{
    let (client, background) = AsyncClient::connect(connect)
        .await
        .map_err(|e| Error::transport("rfc2136", format!("Cannot reach nameserver: {e}")))?;
    tokio::spawn(background);

    client
        .send(request)
        .first_answer()
        .await
        .map_err(|e| Error::transport("rfc2136", format!("DNS update failed: {e}")))
}

/// Map the response code of an update answer
pub fn check_response(code: ResponseCode) -> Result<()> {
    match code {
        ResponseCode::NoError => Ok(()),
        code => {
            tracing::error!("DNS UPDATE rejected with response code: {:?}", code);
            Err(Error::protocol(
                "rfc2136",
                format!("{code:?}"),
                "update rejected by nameserver",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_error_is_success() {
        assert!(check_response(ResponseCode::NoError).is_ok());
    }

    #[test]
    fn test_rejection_carries_rcode() {
        for code in [ResponseCode::Refused, ResponseCode::NotAuth, ResponseCode::ServFail] {
            let err = check_response(code).unwrap_err();
            match &err {
                Error::Protocol { provider, code: c, .. } => {
                    assert_eq!(*provider, "rfc2136");
                    assert_eq!(c, &format!("{code:?}"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(err.is_retriable());
        }
    }

    #[tokio::test]
    async fn test_unreachable_nameserver_is_transport_error() {
        // TCP to a closed local port fails fast
        let transport = HickoryTransport::new(
            Nameserver::parse("127.0.0.1:1").unwrap(),
            DnsTransport::Tcp,
            Duration::from_millis(500),
            None,
        );

        let err = transport.send(Message::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
