use common::crypto::PublicKey;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{endpoint_url, ApiRequest, RegistryError};

/// `GET /ga4gh/drs/v1/service-info`
#[derive(Debug, Clone, Copy)]
pub struct ServiceInfoRequest;

impl ApiRequest for ServiceInfoRequest {
    type Response = ServiceInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint_url(base_url, "service-info"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crypt4ghInfo {
    /// Base64 of the server's raw X25519 public key
    pub pubkey: String,
}

/// GA4GH service-info document.
///
/// Only the Crypt4gh extension is interpreted. Everything else the server sends is
/// kept as-is in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypt4gh: Option<Crypt4ghInfo>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServiceInfo {
    /// Decode the advertised Crypt4gh public key
    pub fn public_key(&self) -> Result<PublicKey, RegistryError> {
        let info = self
            .crypt4gh
            .as_ref()
            .ok_or(RegistryError::NoAdvertisedKey)?;
        PublicKey::from_base64(&info.pubkey).map_err(RegistryError::InvalidServerKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() -> serde_json::Value {
        json!({
            "contactUrl": "contact/abc",
            "createdAt": "2020-01-01",
            "description": "Description of service.",
            "id": "TEMPID1",
            "name": "TEMP_STUB",
            "organization": {"name": "Parent organization", "url": "parent/abc"},
            "type": {"artifact": "TEMP_ARTIFACT", "group": "TEMP_GROUP", "version": "v1"},
            "version": "0.0.0"
        })
    }

    #[test]
    fn test_parse_with_crypt4gh() {
        let mut value = plain();
        value["crypt4gh"] = json!({"pubkey": "AmEsb2n0m5mc6aadwpK4sT6zNapqgH+nnysNtpKa2Ag="});

        let info: ServiceInfo = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(info.id.as_deref(), Some("TEMPID1"));
        assert_eq!(info.extra["organization"]["name"], "Parent organization");

        let key = info.public_key().unwrap();
        assert_eq!(key.to_base64(), "AmEsb2n0m5mc6aadwpK4sT6zNapqgH+nnysNtpKa2Ag=");

        // unknown fields survive a round trip
        assert_eq!(serde_json::to_value(&info).unwrap(), value);
    }

    #[test]
    fn test_parse_without_crypt4gh() {
        let info: ServiceInfo = serde_json::from_value(plain()).unwrap();
        assert!(info.crypt4gh.is_none());
        assert!(matches!(
            info.public_key(),
            Err(RegistryError::NoAdvertisedKey)
        ));
    }

    #[test]
    fn test_invalid_advertised_key() {
        let mut value = plain();
        value["crypt4gh"] = json!({"pubkey": "c2hvcnQ="});
        let info: ServiceInfo = serde_json::from_value(value).unwrap();
        assert!(matches!(
            info.public_key(),
            Err(RegistryError::InvalidServerKey(_))
        ));
    }
}
