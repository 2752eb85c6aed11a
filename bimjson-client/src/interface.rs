// Interface proxies and bound method stubs.
//
// A proxy is built once per discovered interface from the metadata the
// server reports about itself, and never rebuilt. Stubs are plain data
// records; invocation goes through a named-argument builder that delegates
// to `Session::invoke`.

use crate::session::Session;
use bimjson_core::{MethodDescriptor, ParameterDescriptor, RpcError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Parameter metadata carried for introspection. Has no effect on
/// dispatch: the wire format is named parameters either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub type_name: Option<String>,
    pub doc: Option<String>,
}

impl From<ParameterDescriptor> for ParameterSpec {
    fn from(descriptor: ParameterDescriptor) -> Self {
        ParameterSpec {
            type_name: descriptor
                .type_ref
                .as_ref()
                .and_then(|t| t.display_name())
                .map(str::to_string),
            name: descriptor.name,
            doc: descriptor.doc,
        }
    }
}

/// One bound method: the name it is invoked under plus whatever
/// documentation the server reported at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    name: String,
    doc: Option<String>,
    return_doc: Option<String>,
    /// `None` when the server predates parameter metadata; the stub then
    /// accepts an open set of named arguments.
    parameters: Option<Vec<ParameterSpec>>,
}

impl MethodStub {
    pub(crate) fn new(
        descriptor: MethodDescriptor,
        parameters: Option<Vec<ParameterDescriptor>>,
    ) -> Self {
        MethodStub {
            name: descriptor.name,
            doc: descriptor.doc,
            return_doc: descriptor.return_doc,
            parameters: parameters.map(|list| list.into_iter().map(Into::into).collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Server-reported description of the return value, when any.
    pub fn return_doc(&self) -> Option<&str> {
        self.return_doc.as_deref()
    }

    /// Server-reported parameter specs, in reported order. `None` when the
    /// server did not expose parameter metadata.
    pub fn parameters(&self) -> Option<&[ParameterSpec]> {
        self.parameters.as_deref()
    }

    pub fn parameter_names(&self) -> Option<Vec<&str>> {
        self.parameters
            .as_ref()
            .map(|list| list.iter().map(|p| p.name.as_str()).collect())
    }

    /// One-line help text: `name(param: Type, ...) - doc`.
    pub fn describe(&self) -> String {
        let signature = match &self.parameters {
            Some(list) => list
                .iter()
                .map(|p| match &p.type_name {
                    Some(type_name) => format!("{}: {}", p.name, type_name),
                    None => p.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            None => "..".to_string(),
        };
        match &self.doc {
            Some(doc) => format!("{}({}) - {}", self.name, signature, doc),
            None => format!("{}({})", self.name, signature),
        }
    }
}

/// A discovered interface: its short name and the exact method set the
/// server reported, in reported order.
#[derive(Debug, Clone)]
pub struct InterfaceProxy {
    name: String,
    methods: IndexMap<String, MethodStub>,
}

impl InterfaceProxy {
    pub(crate) fn new(name: String, stubs: Vec<MethodStub>) -> Self {
        let methods = stubs
            .into_iter()
            .map(|stub| (stub.name.clone(), stub))
            .collect();
        InterfaceProxy { name, methods }
    }

    /// Short discovered name, as used on the wire.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<&MethodStub> {
        self.methods.get(name)
    }

    /// Every method name reported at discovery, no more and no less.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodStub> {
        self.methods.values()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A proxy borrowed together with the session that can invoke it.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceHandle<'a> {
    session: &'a Session,
    proxy: &'a InterfaceProxy,
}

impl<'a> InterfaceHandle<'a> {
    pub(crate) fn new(session: &'a Session, proxy: &'a InterfaceProxy) -> Self {
        InterfaceHandle { session, proxy }
    }

    pub fn proxy(&self) -> &'a InterfaceProxy {
        self.proxy
    }

    /// Start a call to `method`. Fails with `UnknownMethod` for names the
    /// server never reported for this interface.
    pub fn call(&self, method: &str) -> Result<MethodCall<'a>, RpcError> {
        let stub = self
            .proxy
            .method(method)
            .ok_or_else(|| RpcError::unknown_method(self.proxy.name(), method))?;
        Ok(MethodCall {
            session: self.session,
            interface: self.proxy.name(),
            method: stub.name(),
            parameters: Map::new(),
        })
    }
}

/// Named-argument builder for one remote call.
#[derive(Debug)]
pub struct MethodCall<'a> {
    session: &'a Session,
    interface: &'a str,
    method: &'a str,
    parameters: Map<String, Value>,
}

impl MethodCall<'_> {
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn args(mut self, pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.parameters.extend(pairs);
        self
    }

    /// Perform the blocking round trip and return the decoded result.
    pub fn send(self) -> Result<Value, RpcError> {
        self.session
            .invoke(self.interface, self.method, self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimjson_core::TypeRef;

    fn stub(name: &str, doc: Option<&str>, parameters: Option<Vec<ParameterSpec>>) -> MethodStub {
        MethodStub {
            name: name.to_string(),
            doc: doc.map(str::to_string),
            return_doc: None,
            parameters,
        }
    }

    #[test]
    fn test_proxy_reports_exact_method_set() {
        let proxy = InterfaceProxy::new(
            "ServiceInterface".to_string(),
            vec![
                stub("addProject", None, None),
                stub("getAllProjects", None, None),
            ],
        );
        let names: Vec<_> = proxy.method_names().collect();
        assert_eq!(names, vec!["addProject", "getAllProjects"]);
        assert!(proxy.method("addProject").is_some());
        assert!(proxy.method("deleteProject").is_none());
    }

    #[test]
    fn test_describe_with_parameter_metadata() {
        let stub = stub(
            "addProject",
            Some("Add a new project"),
            Some(vec![ParameterSpec {
                name: "projectName".to_string(),
                type_name: Some("String".to_string()),
                doc: None,
            }]),
        );
        assert_eq!(
            stub.describe(),
            "addProject(projectName: String) - Add a new project"
        );
    }

    #[test]
    fn test_describe_without_parameter_metadata() {
        let stub = stub("addProject", None, None);
        assert_eq!(stub.describe(), "addProject(..)");
    }

    #[test]
    fn test_parameter_spec_from_descriptor() {
        let descriptor = ParameterDescriptor {
            name: "projectName".to_string(),
            doc: Some("name of the new project".to_string()),
            type_ref: Some(TypeRef {
                name: Some("java.lang.String".to_string()),
                simple_name: Some("String".to_string()),
            }),
        };
        let spec = ParameterSpec::from(descriptor);
        assert_eq!(spec.name, "projectName");
        assert_eq!(spec.type_name.as_deref(), Some("String"));
        assert_eq!(spec.doc.as_deref(), Some("name of the new project"));
    }
}
