//! JSON messages pushed over the subscription WebSocket.

use serde::{Deserialize, Serialize};

use crate::snapshot::{Child, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamMessage {
    /// Full current contents of the collection
    Snapshot { children: Vec<Child> },
    /// The server is ending the subscription
    Cancelled { message: String },
}

impl StreamMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl From<Snapshot> for StreamMessage {
    fn from(snapshot: Snapshot) -> Self {
        StreamMessage::Snapshot {
            children: snapshot.children,
        }
    }
}
