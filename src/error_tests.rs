//! Tests for error types

#[cfg(test)]
mod tests {
    use super::super::error::BotError;

    #[test]
    fn test_malformed_post_error() {
        let err = BotError::malformed("Tweet contains no core and tweet key");
        assert!(err.to_string().contains("Malformed post"));
        assert!(err.to_string().contains("no core"));
    }

    #[test]
    fn test_api_error() {
        let err = BotError::Api("coingecko returned 500".to_string());
        assert!(err.to_string().contains("API error"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_websocket_error() {
        let err = BotError::WebSocket("Connection lost".to_string());
        assert!(err.to_string().contains("WebSocket error"));
    }

    #[test]
    fn test_config_error() {
        let err = BotError::Config("missing channel for stocks".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_delivery_error() {
        let err = BotError::Delivery {
            channel: "1234".to_string(),
            reason: "Missing Access".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("1234"));
        assert!(msg.contains("Missing Access"));
    }

    #[test]
    fn test_collaborator_unavailable() {
        let err = BotError::CollaboratorUnavailable("tradingview timeout".to_string());
        assert!(err.to_string().contains("Collaborator unavailable"));
    }

    #[test]
    fn test_rate_limited() {
        let err = BotError::RateLimited {
            retry_after_secs: 60,
        };
        assert!(err.to_string().contains("60 seconds"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: BotError = json_err.into();
        assert!(err.to_string().contains("JSON parsing error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "ledger missing");
        let err: BotError = io_err.into();
        assert!(matches!(err, BotError::Io(_)));
    }

    #[test]
    fn test_error_debug() {
        let err = BotError::Internal("test".to_string());
        let debug = format!("{:?}", err);
        assert!(debug.contains("Internal"));
    }
}
