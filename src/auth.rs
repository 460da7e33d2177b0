//! Kite Connect access token exchange.
//!
//! The interactive login (user id, password, TOTP) happens outside this
//! crate and ends with a redirect carrying a short-lived `request_token`.
//! [`exchange_request_token`] trades it for the day's `access_token` via
//! [`POST /session/token`](https://kite.trade/docs/connect/v3/user/#authentication-and-token-exchange).

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;
use zeroize::Zeroizing;

use crate::Result;
use crate::models::KiteEnvelope;

const TOKEN_PATH: &str = "/session/token";

/// Subset of the `/session/token` payload this crate uses.
#[derive(Deserialize)]
struct SessionData {
    user_id: String,
    access_token: String,
}

/// Exchanges a login `request_token` for an access token.
///
/// # Errors
///
/// Returns a [`GttError`](crate::GttError) if:
/// - The HTTP request fails
/// - The API rejects the request token (`SessionExpired`)
/// - The response cannot be parsed
pub async fn exchange_request_token(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    api_secret: &str,
    request_token: &str,
) -> Result<Zeroizing<String>> {
    let checksum = checksum(api_key, request_token, api_secret);
    let url = format!("{}{TOKEN_PATH}", base_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .header("X-Kite-Version", "3")
        .form(&[
            ("api_key", api_key),
            ("request_token", request_token),
            ("checksum", checksum.as_str()),
        ])
        .send()
        .await?;

    let envelope: KiteEnvelope<SessionData> = response.json().await?;
    let data = envelope.into_data()?;

    info!(user_id = %data.user_id, "Obtained Kite access token");
    Ok(Zeroizing::new(data.access_token))
}

/// Computes the token exchange checksum.
///
/// Algorithm: `hex(SHA-256(api_key + request_token + api_secret))`
fn checksum(api_key: &str, request_token: &str, api_secret: &str) -> String {
    let mut sha256 = Sha256::new();
    sha256.update(api_key.as_bytes());
    sha256.update(request_token.as_bytes());
    sha256.update(api_secret.as_bytes());
    format!("{:x}", sha256.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_hex_sha256_of_concatenation() {
        let sum = checksum("key", "req", "secret");
        assert_eq!(sum.len(), 64);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit()));

        let mut whole = Sha256::new();
        whole.update(b"keyreqsecret");
        assert_eq!(sum, format!("{:x}", whole.finalize()));
    }

    #[test]
    fn checksum_of_empty_input() {
        assert_eq!(
            checksum("", "", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn checksum_depends_on_every_part() {
        let base = checksum("key", "req", "secret");
        assert_ne!(base, checksum("key2", "req", "secret"));
        assert_ne!(base, checksum("key", "req2", "secret"));
        assert_ne!(base, checksum("key", "req", "secret2"));
    }
}
