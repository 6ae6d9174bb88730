use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use tracing::debug;

const USER_AGENT: &str = "pfolio/1.0";

pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Issues a GET and decodes the JSON body. `label` names the request in errors
/// and should not carry credentials.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    label: &str,
) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} for {}", e.without_url(), label))?;

    debug!(status = %response.status(), "Received response for {}", label);
    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} for {}", response.status(), label));
    }

    let text = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response body for {}: {}", label, e.without_url()))?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", label, e))
}

/// Drops the query string, which may hold an API key.
pub fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Deserialize, Debug)]
    struct Payload {
        value: i32,
    }

    #[tokio::test]
    async fn test_get_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 7}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = http_client().unwrap();
        let ok: Payload = get_json(&client, &format!("{}/ok", server.uri()), "ok")
            .await
            .unwrap();
        assert_eq!(ok.value, 7);

        let err = get_json::<Payload>(&client, &format!("{}/missing", server.uri()), "missing")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: 404 Not Found for missing");

        let err = get_json::<Payload>(&client, &format!("{}/broken", server.uri()), "broken")
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Failed to parse JSON response for broken")
        );
    }

    #[tokio::test]
    async fn test_transport_errors_hide_the_query() {
        let client = http_client().unwrap();
        let err = get_json::<Payload>(&client, "http://127.0.0.1:1/v1/eod?access_key=secret", "AAPL")
            .await
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Request error:"));
        assert!(err.ends_with("for AAPL"));
        assert!(!err.contains("secret"));
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://api.example.com/v1/eod?access_key=secret"),
            "https://api.example.com/v1/eod"
        );
        assert_eq!(redact("http://host/path"), "http://host/path");
    }
}
