//! HTTP transport for the Avri client using `reqwest`.

use std::error::Error as StdError;

use async_trait::async_trait;
use avri_core::ports::{TlsVerification, Transport, TransportFailure};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use tracing::debug;

const USER_AGENT: &str = concat!("avri/", env!("CARGO_PKG_VERSION"));

// Certificate verification messages of rustls, openssl, schannel, and Security.framework.
const VERIFICATION_MARKERS: [&str; 8] = [
    "invalid peer certificate",
    "certificate verify failed",
    "unable to get local issuer certificate",
    "self signed certificate",
    "self-signed certificate",
    "certificate has expired",
    "certificate chain was issued by an authority that is not trusted",
    "certificate was not trusted",
];

/// [`Transport`] sending form-encoded POST requests with `reqwest`.
///
/// Holds one client that verifies certificates and one that does not, so the
/// relaxed client is only ever used when the caller asks for it.
pub struct HttpTransport {
    strict: Client,
    relaxed: Client,
}

impl HttpTransport {
    /// Create a transport with default client settings.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error when the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::from_builder(Client::builder)
    }

    /// Create a transport from a builder factory, e.g. to set a timeout.
    ///
    /// The factory is called twice; certificate verification is switched off on
    /// the second builder only.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error when a client cannot be built.
    pub fn from_builder<F: Fn() -> ClientBuilder>(builder: F) -> Result<Self, reqwest::Error> {
        let strict = builder().user_agent(USER_AGENT).build()?;
        let relaxed = builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { strict, relaxed })
    }

    fn client(&self, tls: TlsVerification) -> &Client {
        match tls {
            TlsVerification::Strict => &self.strict,
            TlsVerification::Relaxed => &self.relaxed,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        tls: TlsVerification,
    ) -> Result<Vec<u8>, TransportFailure> {
        debug!(url, ?tls, "posting form");
        fetch_bytes(self.client(tls).post(url).form(form)).await
    }
}

// Small helper to fetch the body with status handling.
// Only connecting can fail certificate verification; status and body errors never do.
async fn fetch_bytes(req: RequestBuilder) -> Result<Vec<u8>, TransportFailure> {
    let body = req
        .send()
        .await
        .map_err(classify_send)?
        .error_for_status()
        .map_err(other)?
        .bytes()
        .await
        .map_err(other)?;

    Ok(body.to_vec())
}

fn other(err: reqwest::Error) -> TransportFailure {
    TransportFailure::Other(Box::new(err))
}

fn classify_send(err: reqwest::Error) -> TransportFailure {
    if is_certificate_error(&err) {
        TransportFailure::Tls(Box::new(err))
    } else {
        other(err)
    }
}

/// Walk the source chain looking for a certificate verification failure.
fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);

    while let Some(cause) = current {
        let message = cause.to_string().to_lowercase();
        if VERIFICATION_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
        {
            return true;
        }
        current = cause.source();
    }

    false
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::fmt;
    use std::io::{Error as IoError, ErrorKind};

    use avri_core::ports::{TlsVerification, Transport, TransportFailure};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{HttpTransport, is_certificate_error};

    /// Wrapper mimicking a client error whose cause sits deeper in the chain.
    #[derive(Debug)]
    struct Wrapped(IoError);

    impl fmt::Display for Wrapped {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "error sending request")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn nested_certificate_error_is_detected() {
        let err = Wrapped(IoError::new(
            ErrorKind::InvalidData,
            "invalid peer certificate: UnknownIssuer",
        ));
        assert!(is_certificate_error(&err));
    }

    #[test]
    fn openssl_verify_failure_is_detected() {
        let err = IoError::other(
            "error:0A000086:SSL routines:tls_post_process_server_certificate:certificate verify failed",
        );
        assert!(is_certificate_error(&err));
    }

    #[test]
    fn self_signed_chain_is_detected() {
        let err = Wrapped(IoError::other(
            "error:0A000086:SSL routines::certificate verify failed:../ssl/statem/statem_clnt.c:1889: (self-signed certificate in certificate chain)",
        ));
        assert!(is_certificate_error(&err));
    }

    #[test]
    fn protocol_version_mismatch_is_not_a_certificate_error() {
        let err = Wrapped(IoError::other(
            "error:0A00010B:SSL routines:ssl3_get_record:wrong version number",
        ));
        assert!(!is_certificate_error(&err));
    }

    #[test]
    fn handshake_alert_is_not_a_certificate_error() {
        let err = Wrapped(IoError::other(
            "error:0A000410:SSL routines:ssl3_read_bytes:sslv3 alert handshake failure",
        ));
        assert!(!is_certificate_error(&err));
    }

    #[test]
    fn certificate_in_url_is_not_a_certificate_error() {
        let err = IoError::other(
            "HTTP status server error (500 Internal Server Error) for url (https://example.test/certificate)",
        );
        assert!(!is_certificate_error(&err));
    }

    #[test]
    fn connection_refused_is_not_a_certificate_error() {
        let err = Wrapped(IoError::new(ErrorKind::ConnectionRefused, "connection refused"));
        assert!(!is_certificate_error(&err));
    }

    #[tokio::test]
    async fn form_is_posted_and_body_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/FetchAdress"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("postCode=1234AB&houseNumber=42&companyCode=tenant"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"dataList":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().expect("default client builds");
        let form = [
            ("postCode", "1234AB".to_owned()),
            ("houseNumber", "42".to_owned()),
            ("companyCode", "tenant".to_owned()),
        ];
        let body = transport
            .post_form(
                &format!("{}/api/FetchAdress", server.uri()),
                &form,
                TlsVerification::Strict,
            )
            .await
            .expect("mock answers");

        assert_eq!(body, br#"{"dataList":[]}"#);
    }

    #[tokio::test]
    async fn relaxed_client_returns_raw_bytes() {
        let payload = vec![0xff, 0x00, 0x7b];
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/GetCalendar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().expect("default client builds");
        let body = transport
            .post_form(
                &format!("{}/api/GetCalendar", server.uri()),
                &[("community", "Avri".to_owned())],
                TlsVerification::Relaxed,
            )
            .await
            .expect("mock answers");

        assert_eq!(body, payload);
    }

    #[tokio::test]
    async fn server_error_is_not_a_tls_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().expect("default client builds");
        let err = transport
            .post_form(
                &format!("{}/api/certificate", server.uri()),
                &[("postCode", "1234AB".to_owned())],
                TlsVerification::Strict,
            )
            .await
            .expect_err("status 500 fails");

        assert!(matches!(err, TransportFailure::Other(_)));
    }
}
