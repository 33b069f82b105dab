//! Conversions from external infrastructure errors into domain errors.

use casefile_common::StoreError;
use casefile_domain::CasefileError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CasefileError);

impl From<InfraError> for CasefileError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CasefileError> for InfraError {
    fn from(value: CasefileError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCasefileError {
    fn into_casefile(self) -> CasefileError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CasefileError */
/* -------------------------------------------------------------------------- */

impl IntoCasefileError for HttpError {
    fn into_casefile(self) -> CasefileError {
        if self.is_timeout() {
            return CasefileError::Timeout("HTTP request timed out".into());
        }

        if self.is_builder() {
            return CasefileError::Config(format!("invalid HTTP request: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return CasefileError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => CasefileError::Auth(message),
                400..=499 => CasefileError::InvalidInput(message),
                _ => CasefileError::Network(message),
            };
        }

        CasefileError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_casefile())
    }
}

/* -------------------------------------------------------------------------- */
/* StoreError → CasefileError */
/* -------------------------------------------------------------------------- */

impl IntoCasefileError for StoreError {
    fn into_casefile(self) -> CasefileError {
        CasefileError::Storage(self.to_string())
    }
}

impl From<StoreError> for InfraError {
    fn from(value: StoreError) -> Self {
        InfraError(value.into_casefile())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use casefile_common::SessionSlot;
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: CasefileError = InfraError::from(error).into();
        match mapped {
            CasefileError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: CasefileError = InfraError::from(error).into();
        assert!(matches!(mapped, CasefileError::Network(_)), "got {mapped:?}");
    }

    #[test]
    fn store_error_maps_to_storage_error() {
        let err = StoreError::Corrupt { slot: SessionSlot::CurrentUser, message: "eof".into() };

        let mapped: CasefileError = InfraError::from(err).into();
        match mapped {
            CasefileError::Storage(msg) => assert!(msg.contains("current_user")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }
}
