//! JSON shapes exchanged with the configuration API.

use scm_core::objects::AddressObject;
use scm_core::objects::AddressType;
use scm_core::objects::StoreError;
use scm_core::objects::StoreResult;
use serde::Deserialize;
use serde::Serialize;

/// An address object as the API sends and accepts it. Exactly one of the
/// type-named value fields is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_netmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_wildcard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

impl AddressWire {
    pub fn from_object(object: &AddressObject, folder: Option<&str>) -> Self {
        let mut wire = Self {
            id: None,
            name: object.name.clone(),
            folder: folder.map(str::to_string),
            description: (!object.description.is_empty()).then(|| object.description.clone()),
            tag: object.tags.iter().cloned().collect(),
            ..Self::default()
        };
        let value = Some(object.value.clone());
        match object.address_type {
            AddressType::IpNetmask => wire.ip_netmask = value,
            AddressType::IpRange => wire.ip_range = value,
            AddressType::IpWildcard => wire.ip_wildcard = value,
            AddressType::Fqdn => wire.fqdn = value,
        }
        wire
    }

    pub fn into_object(self) -> StoreResult<AddressObject> {
        let typed = [
            (AddressType::IpNetmask, self.ip_netmask),
            (AddressType::IpRange, self.ip_range),
            (AddressType::IpWildcard, self.ip_wildcard),
            (AddressType::Fqdn, self.fqdn),
        ];
        let mut present = typed
            .into_iter()
            .filter_map(|(address_type, value)| value.map(|v| (address_type, v)));
        let (address_type, value) = match (present.next(), present.next()) {
            (Some(found), None) => found,
            _ => {
                return Err(StoreError::Validation(format!(
                    "address '{}' must carry exactly one of ip_netmask, ip_range, ip_wildcard, fqdn",
                    self.name
                )));
            }
        };
        Ok(AddressObject {
            name: self.name,
            address_type,
            value,
            description: self.description.unwrap_or_default(),
            tags: self.tag.into_iter().collect(),
        })
    }
}

/// Paginated collection envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub offset: u64,
    /// Absent on some deployments; paging then runs until a short page.
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "_errors", default)]
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorItem {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    /// First error message, prefixed with its code when present.
    pub fn summary(&self) -> Option<String> {
        self.errors.first().map(|item| match &item.code {
            Some(code) => format!("{code}: {}", item.message),
            None => item.message.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub grant_type: &'static str,
    pub scope: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_object_maps_type_to_field() {
        let mut object = AddressObject::new("web", AddressType::IpRange, "10.0.0.1-10.0.0.9");
        object.tags.insert("prod".to_string());
        let wire = AddressWire::from_object(&object, Some("Texas"));
        assert_eq!(wire.ip_range.as_deref(), Some("10.0.0.1-10.0.0.9"));
        assert_eq!(wire.ip_netmask, None);
        assert_eq!(wire.description, None);

        let json = serde_json::to_value(&wire).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "web",
                "folder": "Texas",
                "tag": ["prod"],
                "ip_range": "10.0.0.1-10.0.0.9"
            })
        );
        assert_eq!(wire.into_object().expect("back"), object);
    }

    #[test]
    fn test_untyped_address_rejected() {
        let wire = AddressWire {
            name: "odd".to_string(),
            ..AddressWire::default()
        };
        assert!(matches!(wire.into_object(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_error_body_summary() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"_errors":[{"code":"E003","message":"Object already exists"}],"_request_id":"x"}"#,
        )
        .expect("parse");
        assert_eq!(body.summary().as_deref(), Some("E003: Object already exists"));
    }
}
