//! HMAC-SHA256 request signing for the chat service handshake.
//!
//! The service authenticates the WebSocket upgrade through query parameters:
//!
//! ```text
//! signature_origin = "host: <host>\ndate: <date>\nGET <path> HTTP/1.1"
//! signature        = base64(hmac_sha256(api_secret, signature_origin))
//! authorization    = base64('api_key="..", algorithm="hmac-sha256", headers="host date request-line", signature=".."')
//! signed_url       = <url>?authorization=..&date=..&host=..   (values url-encoded)
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

use weft_core::error::{Result, WeftError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "hmac-sha256";
const SIGNED_HEADERS: &str = "host date request-line";

/// Current time as an RFC 1123 date, e.g. `Thu, 01 Jan 2026 00:00:00 GMT`.
pub fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Build the signed connection URL for `url` at the given `date`.
///
/// Deterministic for fixed inputs; callers pin `date` to reproduce a
/// signature.
pub fn sign_url(url: &str, api_key: &str, api_secret: &str, date: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| WeftError::Signing(format!("{url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| WeftError::Signing(format!("{url}: no host")))?;

    let signature = signature(host, date, parsed.path(), api_secret)?;
    let origin = format!(
        "api_key=\"{api_key}\", algorithm=\"{ALGORITHM}\", headers=\"{SIGNED_HEADERS}\", signature=\"{signature}\""
    );
    let authorization = BASE64.encode(origin.as_bytes());

    let sep = if url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{url}{sep}authorization={}&date={}&host={}",
        urlencoding::encode(&authorization),
        urlencoding::encode(date),
        urlencoding::encode(host),
    ))
}

fn signature(host: &str, date: &str, path: &str, api_secret: &str) -> Result<String> {
    let canonical = format!("host: {host}\ndate: {date}\nGET {path} HTTP/1.1");
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|e| WeftError::Signing(e.to_string()))?;
    mac.update(canonical.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
