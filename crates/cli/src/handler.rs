//! Request handler used by `discover-tcp listen`.

use async_trait::async_trait;
use corelib::{Contact, NodeId};
use dashmap::DashMap;
use serde_json::Value;
use transport::{RequestHandler, Responder};

/// Answers requests from the set of senders seen so far.
///
/// PING is answered with the local contact. FIND-NODE is answered with the
/// matching contact when it is known, otherwise with every known contact.
/// Senders without transport info are not remembered.
#[derive(Debug)]
pub struct KnownContacts {
    local: Contact,
    known: DashMap<NodeId, Contact>,
}

impl KnownContacts {
    pub fn new(local: Contact) -> Self {
        Self {
            local,
            known: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    fn remember(&self, sender: Option<Contact>) {
        let Some(sender) = sender else {
            return;
        };
        if sender.transport.is_some() && sender.id != self.local.id {
            self.known.insert(sender.id.clone(), sender);
        }
    }

    fn lookup(&self, node_id: &NodeId) -> Value {
        if let Some(found) = self.known.get(node_id) {
            return serde_json::to_value(found.value()).unwrap_or(Value::Null);
        }
        let contacts: Vec<Contact> = self.known.iter().map(|entry| entry.value().clone()).collect();
        serde_json::to_value(contacts).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

#[async_trait]
impl RequestHandler for KnownContacts {
    async fn find_node(&self, node_id: NodeId, sender: Option<Contact>, responder: Responder) {
        let response = self.lookup(&node_id);
        self.remember(sender);
        responder.reply(response);
    }

    async fn ping(&self, _node_id: NodeId, sender: Option<Contact>, responder: Responder) {
        self.remember(sender);
        match serde_json::to_value(&self.local) {
            Ok(local) => responder.reply(local),
            Err(e) => responder.reject(e),
        };
    }
}
