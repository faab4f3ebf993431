//! Messaging gateway wire types.
//!
//! Inbound frames decode to a [`GatewayEvent`] envelope whose `data` stays
//! opaque until the session asks for a chat message. Outbound replies are
//! [`OutboundMessage`] frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type the sessions subscribe to.
pub const EVENT_MESSAGE_NEW: &str = "message_new";

/// Message kind that triggers command resolution.
pub const MESSAGE_TYPE_COMMAND: &str = "command";

/// Parameters needed to dial the gateway event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketParams {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Envelope of one inbound event-stream frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

impl GatewayEvent {
    /// Decode the payload as a new-message event.
    pub fn message_data(&self) -> Result<MessageNewData, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Payload of a `message_new` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageNewData {
    pub message: ChatMessage,
}

/// A chat message as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub content: String,
    pub chat_id: u64,
}

impl ChatMessage {
    pub fn is_command(&self) -> bool {
        self.message_type == MESSAGE_TYPE_COMMAND
    }
}

/// Visibility scope of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageScope {
    Public,
    Private,
}

/// Price attached to a product card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCost {
    pub value: f64,
    pub currency: String,
}

/// Stock quantity attached to a product card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageQuantity {
    pub value: f64,
    pub unit: String,
}

/// Structured product reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageProduct {
    pub id: u64,
    pub name: String,
    pub article: String,
    pub url: String,
    pub img: String,
    pub cost: MessageCost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<MessageQuantity>,
}

/// Body of an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Text { content: String },
    Product { product: MessageProduct },
}

/// Reply frame sent back through the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub scope: MessageScope,
    pub chat_id: u64,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl OutboundMessage {
    /// Private reply to the given chat.
    pub fn private(chat_id: u64, body: MessageBody) -> Self {
        Self {
            scope: MessageScope::Private,
            chat_id,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_command_event() {
        let frame = json!({
            "type": "message_new",
            "meta": {"timestamp": 1},
            "data": {"message": {"id": 7, "type": "command", "content": "/payment", "chat_id": 42}}
        });
        let event: GatewayEvent = serde_json::from_value(frame).unwrap();
        assert_eq!(event.event_type, EVENT_MESSAGE_NEW);

        let data = event.message_data().unwrap();
        assert!(data.message.is_command());
        assert_eq!(data.message.content, "/payment");
        assert_eq!(data.message.chat_id, 42);
    }

    #[test]
    fn test_text_reply_wire_shape() {
        let message = OutboundMessage::private(
            42,
            MessageBody::Text {
                content: "hello".to_string(),
            },
        );
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({"scope": "private", "chat_id": 42, "type": "text", "content": "hello"})
        );
    }

    #[test]
    fn test_product_reply_omits_missing_quantity() {
        let message = OutboundMessage::private(
            1,
            MessageBody::Product {
                product: MessageProduct {
                    id: 10,
                    name: "Wrench".to_string(),
                    article: "A1".to_string(),
                    url: "https://shop/wrench".to_string(),
                    img: "https://shop/wrench.png".to_string(),
                    cost: MessageCost {
                        value: 9.5,
                        currency: "usd".to_string(),
                    },
                    quantity: None,
                },
            },
        );
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "product");
        assert_eq!(value["product"]["cost"]["currency"], "usd");
        assert!(value["product"].get("quantity").is_none());
    }
}
