//! Header set impersonating the vendor's official Android app.
//!
//! The cloud rejects requests that do not look like the mobile app, so the
//! full header block is sent on every call, exactly as the app does.

const APP_NAME: &str = "TP-Link_Tapo_Android";
const APP_VERSION: &str = "3.15.117";

/// Per-account credentials for the cloud API.
///
/// `authorization` is the bearer value captured from the mobile app;
/// `terminal_id` is the app-install UUID the cloud pairs it with.
#[derive(Clone, Debug)]
pub struct ClientAuth {
    authorization: String,
    terminal_id: String,
}

impl ClientAuth {
    pub fn new(authorization: impl Into<String>, terminal_id: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
            terminal_id: terminal_id.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.authorization.trim().is_empty() && !self.terminal_id.trim().is_empty()
    }

    /// Full header block for a cloud request.
    pub(crate) fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", self.authorization.clone()),
            ("App-Cid", format!("app:{}:{}", APP_NAME, self.terminal_id)),
            ("X-App-Name", APP_NAME.to_string()),
            ("X-App-Version", APP_VERSION.to_string()),
            ("X-Term-Id", self.terminal_id.clone()),
            ("X-Ospf", "Android 11".to_string()),
            ("X-Net-Type", "wifi".to_string()),
            ("X-Strict", "0".to_string()),
            ("X-Locale", "en_US".to_string()),
            ("User-Agent", format!("{}/{}", APP_NAME, APP_VERSION)),
            (
                "Content-Type",
                "application/json; charset=UTF-8".to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        assert!(ClientAuth::new("token", "uuid").is_configured());
        assert!(!ClientAuth::new("", "uuid").is_configured());
        assert!(!ClientAuth::new("token", "  ").is_configured());
    }

    #[test]
    fn test_app_cid_header() {
        let auth = ClientAuth::new("token", "abc-123");
        let headers = auth.headers();
        let app_cid = headers
            .iter()
            .find(|(name, _)| *name == "App-Cid")
            .map(|(_, value)| value.as_str());
        assert_eq!(app_cid, Some("app:TP-Link_Tapo_Android:abc-123"));
    }
}
