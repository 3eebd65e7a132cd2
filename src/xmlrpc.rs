//! Minimal XML-RPC client used by the SMS gateway and the heartbeat
//!
//! Only string parameters are ever sent, and the only thing read back from a response is
//! whether it is a `<fault>`.

use anyhow::{Context, bail};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use reqwest::header::CONTENT_TYPE;
use tracing::{instrument, trace};

/// Encode a `methodCall` with string parameters
pub fn method_call(method: &str, params: &[&str]) -> String {
    let mut body = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    body.push_str(&escape(method));
    body.push_str("</methodName><params>");

    for param in params {
        body.push_str("<param><value><string>");
        body.push_str(&escape(*param));
        body.push_str("</string></value></param>");
    }

    body.push_str("</params></methodCall>");
    body
}

/// Fail if `body` is not a `methodResponse` or if it carries a fault
pub fn check_response(body: &str) -> anyhow::Result<()> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut is_response = false;
    let mut in_fault = false;
    let mut fault = Vec::new();

    loop {
        match reader.read_event().context("malformed XML-RPC response")? {
            Event::Start(element) | Event::Empty(element) => match element.name().as_ref() {
                b"methodResponse" => is_response = true,
                b"fault" => in_fault = true,
                _ => {}
            },
            Event::Text(text) if in_fault => fault.push(text.unescape()?.into_owned()),
            Event::Eof => break,
            _ => {}
        }
    }

    if in_fault {
        bail!("XML-RPC fault: {}", fault.join(" "));
    }

    if !is_response {
        bail!("not an XML-RPC response");
    }

    Ok(())
}

/// POST a method call to `url` and check the answer
#[instrument(skip(client, params))]
pub async fn call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: &[&str],
) -> anyhow::Result<()> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "text/xml")
        .body(method_call(method, params))
        .send()
        .await
        .with_context(|| format!("failed to call {method} on {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("{url} answered {method} with status {status}");
    }

    let body = response
        .text()
        .await
        .context("failed to read XML-RPC response")?;
    trace!("response: {body}");

    check_response(&body)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const OK: &str = "<?xml version=\"1.0\"?><methodResponse><params><param><value>\
        <boolean>1</boolean></value></param></params></methodResponse>";

    const FAULT: &str = "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
        <member><name>faultCode</name><value><int>4</int></value></member>\
        <member><name>faultString</name><value><string>unknown recipient</string></value></member>\
        </struct></value></fault></methodResponse>";

    #[test]
    fn test_method_call_escapes_params() {
        assert_eq!(
            method_call("neit.sendSMS", &["4711", "a < b & c"]),
            "<?xml version=\"1.0\"?><methodCall><methodName>neit.sendSMS</methodName><params>\
             <param><value><string>4711</string></value></param>\
             <param><value><string>a &lt; b &amp; c</string></value></param>\
             </params></methodCall>"
        );
    }

    #[test]
    fn test_plain_response_is_ok() {
        assert!(check_response(OK).is_ok());
    }

    #[test]
    fn test_fault_is_reported() {
        let error = check_response(FAULT).unwrap_err().to_string();
        assert!(error.contains("unknown recipient"), "{error}");
    }

    #[test]
    fn test_non_response_is_rejected() {
        assert!(check_response("<html><body>oops</body></html>").is_err());
    }

    #[tokio::test]
    async fn test_call_posts_method() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "text/xml"))
            .and(body_string_contains("<methodName>logStatus</methodName>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        call(&client, &server.uri(), "logStatus", &["feedwatch"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_call_fails_on_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FAULT))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        assert!(call(&client, &server.uri(), "logStatus", &[]).await.is_err());
    }
}
