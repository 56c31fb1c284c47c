//! Security token request against the Microsoft Online STS.
//!
//! Sends a WS-Trust `Issue` request (SOAP 1.2) carrying the user's name and
//! password and the site root as `AppliesTo`, and returns the compact binary
//! security token from the response.

use quick_xml::escape::escape;
use reqwest::{Client, header};
use spfed_core::{Credentials, Error};
use tracing::instrument;

use crate::site::TargetSite;
use crate::xml::extract_node;

/// Location of the token in the STS response.
pub const TOKEN_SELECTOR: &str =
    "S|Envelope S|Body wst|RequestSecurityTokenResponse wst|RequestedSecurityToken wsse|BinarySecurityToken";

/// Location of the human-readable reason in a SOAP 1.2 fault.
const FAULT_SELECTOR: &str = "S|Envelope S|Body S|Fault S|Reason S|Text";

/// Build the WS-Trust issue envelope. Username, password and address are XML-escaped.
pub fn build_envelope(sts_url: &str, site: &TargetSite, creds: &Credentials) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
      xmlns:a="http://www.w3.org/2005/08/addressing"
      xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <s:Header>
    <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/02/trust/RST/Issue</a:Action>
    <a:ReplyTo>
      <a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address>
    </a:ReplyTo>
    <a:To s:mustUnderstand="1">{to}</a:To>
    <o:Security s:mustUnderstand="1"
       xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <o:UsernameToken>
        <o:Username>{username}</o:Username>
        <o:Password>{password}</o:Password>
      </o:UsernameToken>
    </o:Security>
  </s:Header>
  <s:Body>
    <t:RequestSecurityToken xmlns:t="http://schemas.xmlsoap.org/ws/2005/02/trust">
      <wsp:AppliesTo xmlns:wsp="http://schemas.xmlsoap.org/ws/2004/09/policy">
        <a:EndpointReference>
          <a:Address>{address}</a:Address>
        </a:EndpointReference>
      </wsp:AppliesTo>
      <t:KeyType>http://schemas.xmlsoap.org/ws/2005/05/identity/NoProofKey</t:KeyType>
      <t:RequestType>http://schemas.xmlsoap.org/ws/2005/02/trust/Issue</t:RequestType>
      <t:TokenType>urn:oasis:names:tc:SAML:1.0:assertion</t:TokenType>
    </t:RequestSecurityToken>
  </s:Body>
</s:Envelope>"#,
        to = escape(sts_url),
        username = escape(creds.username.as_str()),
        password = escape(creds.password.as_str()),
        address = escape(site.base_url().as_str()),
    )
}

/// Request a binary security token for `site`.
///
/// # Errors
///
/// - `Error::Network` if the request cannot be sent or the body cannot be read
/// - `Error::Parse` if the response is not well-formed XML
/// - `Error::Auth` if the response carries no token
#[instrument(skip(http, creds), fields(site = %site))]
pub async fn request_security_token(
    http: &Client, sts_url: &str, site: &TargetSite, creds: &Credentials,
) -> Result<String, Error> {
    let body = build_envelope(sts_url, site, creds);

    let response = http
        .post(sts_url)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(body)
        .send()
        .await
        .map_err(|e| Error::Network(format!("security token request failed: {e}")))?;

    let status = response.status();
    tracing::debug!(status = status.as_u16(), "STS responded");

    let xml = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("failed to read STS response: {e}")))?;

    let token = extract_node(&xml, TOKEN_SELECTOR)?;
    if token.is_empty() {
        let reason = extract_node(&xml, FAULT_SELECTOR).unwrap_or_default();
        return Err(Error::Auth(if reason.is_empty() {
            format!("STS returned no security token (status {})", status.as_u16())
        } else {
            format!("STS returned no security token: {reason}")
        }));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> TargetSite {
        TargetSite::parse("https://contoso.sharepoint.com/sites/Foo").unwrap()
    }

    #[test]
    fn test_envelope_embeds_credentials_and_site() {
        let creds = Credentials::new("alice@contoso.com", "s3cret");
        let envelope = build_envelope("https://login.microsoftonline.com/extSTS.srf", &site(), &creds);

        assert!(envelope.contains("<o:Username>alice@contoso.com</o:Username>"));
        assert!(envelope.contains("<o:Password>s3cret</o:Password>"));
        assert!(envelope.contains("<a:Address>https://contoso.sharepoint.com/</a:Address>"));
        assert!(envelope.contains("http://schemas.xmlsoap.org/ws/2005/02/trust/RST/Issue"));
        assert!(!envelope.contains("sites/Foo"));
    }

    #[test]
    fn test_envelope_escapes_markup() {
        let creds = Credentials::new("bob&co", "p<a>ss\"'");
        let envelope = build_envelope("https://login.microsoftonline.com/extSTS.srf", &site(), &creds);

        assert!(envelope.contains("<o:Username>bob&amp;co</o:Username>"));
        assert!(envelope.contains("<o:Password>p&lt;a&gt;ss&quot;&apos;</o:Password>"));
        assert!(!envelope.contains("p<a>ss"));
    }

    #[test]
    fn test_escaped_envelope_is_well_formed() {
        let creds = Credentials::new("bob&co", "</o:Password><x>");
        let envelope = build_envelope("https://login.microsoftonline.com/extSTS.srf", &site(), &creds);

        let password = extract_node(&envelope, "s|Envelope s|Header o|Security o|UsernameToken o|Password").unwrap();
        assert_eq!(password, "</o:Password><x>");
    }
}
