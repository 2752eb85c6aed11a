// Discovery metadata reported by the server's meta-interface. All of these
// are fetched once at session construction and never invalidated.

use serde::{Deserialize, Serialize};

/// One entry of `getServiceInterfaces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDescriptor {
    pub simple_name: String,
    /// Fully qualified name, e.g. `org.bimserver.ServiceInterface`.
    pub name: String,
}

/// One entry of `getServiceMethods`. The server reports more fields than
/// these; anything beyond name and documentation is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Return-value description, when the server reports one.
    #[serde(rename = "returnDoc", default, skip_serializing_if = "Option::is_none")]
    pub return_doc: Option<String>,
}

/// One entry of `getServiceMethodParameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

/// Type descriptor attached to a parameter. Older servers report only one
/// of the two name fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_name: Option<String>,
}

impl TypeRef {
    /// Preferred human-readable name: the simple name when present,
    /// otherwise the qualified one.
    pub fn display_name(&self) -> Option<&str> {
        self.simple_name.as_deref().or(self.name.as_deref())
    }
}

/// Payload of `getServerInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: ServerVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl ServerVersion {
    /// Component-wise comparison: every component must individually be
    /// at least the required one. 1.6.0 does NOT satisfy at_least(1, 5, 183);
    /// this mirrors how the server publishes feature availability.
    pub fn at_least(&self, major: u32, minor: u32, revision: u32) -> bool {
        self.major >= major && self.minor >= minor && self.revision >= revision
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interface_descriptor_field_names() {
        let descriptor: InterfaceDescriptor = serde_json::from_value(json!({
            "simpleName": "ServiceInterface",
            "name": "org.bimserver.ServiceInterface"
        }))
        .unwrap();
        assert_eq!(descriptor.simple_name, "ServiceInterface");
        assert_eq!(descriptor.name, "org.bimserver.ServiceInterface");
    }

    #[test]
    fn test_method_descriptor_ignores_extra_fields() {
        let descriptor: MethodDescriptor = serde_json::from_value(json!({
            "name": "addProject",
            "doc": "Add a new project",
            "returnDoc": "the created project",
            "genericType": {"name": "SProject"}
        }))
        .unwrap();
        assert_eq!(descriptor.name, "addProject");
        assert_eq!(descriptor.doc.as_deref(), Some("Add a new project"));
        assert_eq!(descriptor.return_doc.as_deref(), Some("the created project"));
    }

    #[test]
    fn test_parameter_descriptor_type_ref() {
        let descriptor: ParameterDescriptor = serde_json::from_value(json!({
            "name": "projectName",
            "type": {"simpleName": "String"}
        }))
        .unwrap();
        let type_ref = descriptor.type_ref.unwrap();
        assert_eq!(type_ref.display_name(), Some("String"));
    }

    #[test]
    fn test_type_ref_falls_back_to_qualified_name() {
        let type_ref = TypeRef {
            name: Some("java.lang.String".to_string()),
            simple_name: None,
        };
        assert_eq!(type_ref.display_name(), Some("java.lang.String"));
    }

    #[test]
    fn test_version_at_least_all_components_independent() {
        let reported = ServerVersion {
            major: 1,
            minor: 5,
            revision: 200,
        };
        assert!(reported.at_least(1, 5, 183));

        let reported = ServerVersion {
            major: 1,
            minor: 5,
            revision: 100,
        };
        assert!(!reported.at_least(1, 5, 183));

        let reported = ServerVersion {
            major: 1,
            minor: 4,
            revision: 999,
        };
        assert!(!reported.at_least(1, 5, 183));
    }

    #[test]
    fn test_server_info_deserialization() {
        let info: ServerInfo = serde_json::from_value(json!({
            "version": {"major": 1, "minor": 5, "revision": 183}
        }))
        .unwrap();
        assert_eq!(format!("{}", info.version), "1.5.183");
    }
}
