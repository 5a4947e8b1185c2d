use lessons_portal::payments::{HttpPaymentClient, MockPaymentService, PaymentService};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_checkout_success() {
        let mock = MockPaymentService::new();
        let user_id = Uuid::new_v4();
        let result = mock.create_checkout_session(user_id).await;
        assert!(result.is_ok());

        let session = result.unwrap();
        assert!(session.session_id.starts_with("cs_test_"));
        // The session must be traceable back to the user who opened it.
        assert!(session.session_id.contains(&user_id.simple().to_string()));
        assert!(session.url.starts_with("https://"));
    }

    #[tokio::test]
    async fn test_mock_checkout_failure() {
        let mock = MockPaymentService {
            should_fail: true,
            session_paid: true,
        };
        let result = mock.create_checkout_session(Uuid::new_v4()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_verify_paid_session() {
        let mock = MockPaymentService::new();
        let result = mock.verify_session("cs_test_abc").await;
        assert_eq!(result.unwrap(), true);
    }

    #[tokio::test]
    async fn test_mock_verify_unpaid_session() {
        let mock = MockPaymentService {
            should_fail: false,
            session_paid: false,
        };
        let result = mock.verify_session("cs_test_abc").await;
        assert_eq!(result.unwrap(), false);
    }

    #[tokio::test]
    async fn test_mock_verify_rejects_empty_session_id() {
        let mock = MockPaymentService::new();
        let result = mock.verify_session("").await;
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod client_tests {
    use super::*;
    use lessons_portal::config::AppConfig;

    #[tokio::test]
    async fn test_http_client_creation() {
        // Just testing that construction doesn't panic with the default test config.
        let config = AppConfig::default();
        let _client = HttpPaymentClient::new(&config);
    }
}
