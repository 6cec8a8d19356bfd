//! Captured network responses.

use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;

/// One captured DevTools event, reduced to what discovery looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    /// DevTools method name, e.g. `Network.responseReceived`.
    pub method: String,
    /// Response URL, when the event carries a response.
    pub url: Option<String>,
    /// Response MIME type as Chrome reports it.
    pub content_type: Option<String>,
}

impl NetworkEntry {
    pub const RESPONSE_RECEIVED: &'static str = "Network.responseReceived";

    pub fn response(url: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            method: Self::RESPONSE_RECEIVED.to_string(),
            url: Some(url.into()),
            content_type: content_type.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_response(&self) -> bool {
        self.method == Self::RESPONSE_RECEIVED
    }
}

impl From<&ResponseReceivedEventParams> for NetworkEntry {
    fn from(event: &ResponseReceivedEventParams) -> Self {
        Self::response(
            event.response.url.clone(),
            Some(event.response.mime_type.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_entry() {
        let e = NetworkEntry::response(
            "https://host/presentation/abc/video/webcams.webm",
            Some("video/webm".into()),
        );
        assert!(e.is_response());
        assert_eq!(e.content_type.as_deref(), Some("video/webm"));
    }

    #[test]
    fn empty_mime_type_is_dropped() {
        let e = NetworkEntry::response("https://host/a.ogg", Some(String::new()));
        assert!(e.content_type.is_none());
    }

    #[test]
    fn other_methods_are_not_responses() {
        let e = NetworkEntry {
            method: "Network.requestWillBeSent".into(),
            url: Some("https://host/".into()),
            content_type: None,
        };
        assert!(!e.is_response());
    }
}
