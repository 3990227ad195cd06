//! The long-lived transport endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use corelib::{Contact, Error, NodeId, Result, TransportConfig};
use serde_json::Value;

use crate::client::{self, PingOutcome};
use crate::handler::RequestHandler;
use crate::listener::Listener;

/// TCP transport endpoint.
///
/// Owns the local configuration and, once [`listen`](Self::listen) has been
/// called, the running listener. Outbound operations only read the
/// configuration, so they can run concurrently from any number of tasks.
///
/// # Example
///
/// ```no_run
/// use corelib::{Contact, NodeId, TransportConfig};
/// use transport::TcpTransport;
///
/// # async fn run() -> corelib::Result<()> {
/// let transport = TcpTransport::new(TransportConfig::default().with_id("YmFy"));
/// let peer = Contact::new("Zm9v").with_transport("127.0.0.1", 6742);
///
/// let closest = transport
///     .find_node(&peer, &NodeId::from("cXV4"), &transport.local_contact())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TcpTransport {
    config: TransportConfig,
    listener: Option<Listener>,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            listener: None,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// This endpoint as a contact, suitable as the `sender` of requests.
    pub fn local_contact(&self) -> Contact {
        self.config.local_contact()
    }

    /// Stamp `contact.transport` with this endpoint's host and port.
    pub fn set_transport_info(&self, mut contact: Contact) -> Contact {
        contact.transport = Some(self.config.transport_info());
        contact
    }

    /// Bind the configured host and port and start serving requests.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    pub async fn listen<H: RequestHandler>(&mut self, handler: H) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Err(Error::AlreadyListening(listener.local_addr()));
        }
        let listener = Listener::bind(&self.config.host, self.config.port, Arc::new(handler)).await?;
        let local_addr = listener.local_addr();
        self.listener = Some(listener);
        Ok(local_addr)
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Address the listener is bound to, if it is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(Listener::local_addr)
    }

    /// Stop accepting new connections and wait for the listening socket to
    /// close. Requests already being served run to completion.
    pub async fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.close().await;
        }
    }

    /// See [`client::find_node`].
    pub async fn find_node(&self, contact: &Contact, node_id: &NodeId, sender: &Contact) -> Result<Value> {
        client::find_node(contact, node_id, sender).await
    }

    /// See [`client::ping`].
    pub async fn ping(&self, contact: &Contact, sender: &Contact) -> Result<PingOutcome> {
        client::ping(contact, sender).await
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_transport_info() {
        let transport = TcpTransport::new(
            TransportConfig::default().with_host("foo.com").with_port(8888),
        );
        let contact = Contact::new("id").with_data(json!("data"));

        let contact = transport.set_transport_info(contact);
        assert_eq!(
            serde_json::to_value(&contact).unwrap(),
            json!({"id": "id", "data": "data", "transport": {"host": "foo.com", "port": 8888}})
        );
    }

    #[test]
    fn test_set_transport_info_overwrites_stale_address() {
        let config = TransportConfig::default().with_host("foo.com").with_port(8888);
        let transport = TcpTransport::new(config.clone());
        let contact = Contact::new("id").with_transport("10.0.0.5", 9);

        let contact = transport.set_transport_info(contact);
        assert_eq!(contact.transport, Some(config.transport_info()));
        assert_eq!(transport.local_contact().transport, contact.transport);
    }

    #[test]
    fn test_default_endpoint() {
        let transport = TcpTransport::default();
        assert_eq!(transport.config().host, "localhost");
        assert_eq!(transport.config().port, 6742);
        assert!(!transport.is_listening());
        assert_eq!(transport.local_addr(), None);
    }
}
