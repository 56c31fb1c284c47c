//! Shared mock SharePoint endpoints for spfed-client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use spfed_client::{AuthClient, AuthConfig, SessionCache, TargetSite};
use spfed_core::{Credentials, SessionCookies};
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "alice@contoso.com";
pub const PASSWORD: &str = "s3cret";
pub const TOKEN: &str = "t=EwBgAk6hB&p=";
pub const DIGEST: &str = "0xA1B2C3,19 Oct 2026 10:00:00 -0000";
pub const CONTEXTINFO_PATH: &str = "/sites/EDRFTransferPoint/_api/contextinfo";

pub fn sts_token_response(token: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<S:Envelope xmlns:S="http://www.w3.org/2003/05/soap-envelope"
            xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"
            xmlns:wst="http://schemas.xmlsoap.org/ws/2005/02/trust">
  <S:Body>
    <wst:RequestSecurityTokenResponse>
      <wst:TokenType>urn:passport:compact</wst:TokenType>
      <wst:RequestedSecurityToken>
        <wsse:BinarySecurityToken Id="Compact0">{}</wsse:BinarySecurityToken>
      </wst:RequestedSecurityToken>
    </wst:RequestSecurityTokenResponse>
  </S:Body>
</S:Envelope>"#,
        token.replace('&', "&amp;")
    )
}

pub fn sts_fault_response(reason: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<S:Envelope xmlns:S="http://www.w3.org/2003/05/soap-envelope">
  <S:Body>
    <S:Fault>
      <S:Code><S:Value>S:Sender</S:Value></S:Code>
      <S:Reason><S:Text xml:lang="en-US">{reason}</S:Text></S:Reason>
    </S:Fault>
  </S:Body>
</S:Envelope>"#
    )
}

pub fn contextinfo_response(digest: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><d:GetContextWebInformation xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" m:type="SP.ContextWebInformation"><d:FormDigestTimeoutSeconds m:type="Edm.Int32">1800</d:FormDigestTimeoutSeconds><d:FormDigestValue>{digest}</d:FormDigestValue><d:WebFullUrl>https://contoso.sharepoint.com/sites/EDRFTransferPoint</d:WebFullUrl></d:GetContextWebInformation>"#
    )
}

pub fn credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD)
}

pub fn cookies(rtfa: &str, fedauth: &str) -> SessionCookies {
    let mut cookies = SessionCookies::new();
    cookies.insert("rtFa", format!("rtFa={rtfa}"));
    cookies.insert("FedAuth", format!("FedAuth={fedauth}"));
    cookies
}

pub fn site(server: &MockServer) -> TargetSite {
    TargetSite::parse(&format!("{}/sites/Foo/bar?x=1", server.uri())).unwrap()
}

pub fn auth_client(server: &MockServer, cache: Arc<SessionCache>) -> AuthClient {
    let config = AuthConfig {
        sts_url: format!("{}/extSTS.srf", server.uri()),
        user_agent: "spfed-test".to_string(),
        timeout: Duration::from_secs(5),
    };
    AuthClient::new(config, cache).unwrap()
}

/// STS answering with `token`, expected `times` times.
pub async fn mount_sts(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/extSTS.srf"))
        .and(header("content-type", "text/plain"))
        .and(body_string_contains(USERNAME))
        .respond_with(ResponseTemplate::new(200).set_body_string(sts_token_response(token)))
        .expect(times)
        .mount(server)
        .await;
}

/// Sign-in endpoint trading `token` for the given cookie values.
pub async fn mount_signin(server: &MockServer, token: &str, rtfa: &str, fedauth: &str, times: u64) {
    let host = site(server).host().to_string();
    Mock::given(method("POST"))
        .and(path("/_forms/default.aspx"))
        .and(query_param("wa", "wsignin1.0"))
        .and(header("host", host.as_str()))
        .and(header("content-length", token.len().to_string().as_str()))
        .and(body_string(token))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/")
                .append_header("Set-Cookie", format!("rtFa={rtfa}; domain=sharepoint.com; path=/; secure; HttpOnly"))
                .append_header("Set-Cookie", format!("FedAuth={fedauth}; path=/; secure; HttpOnly")),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Digest endpoint answering `status` to requests carrying `cookie`.
pub async fn mount_digest(server: &MockServer, cookie: &str, status: u16, times: u64) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_string(contextinfo_response(DIGEST))
    } else {
        ResponseTemplate::new(status).set_body_string("<html>Forbidden</html>")
    };

    Mock::given(method("POST"))
        .and(path(CONTEXTINFO_PATH))
        .and(header("content-length", "0"))
        .and(header("cookie", cookie))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}
