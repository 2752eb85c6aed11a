// Client session: discovery, naming-scheme detection, login, and the
// generic invoke path every bound stub goes through.

use crate::interface::{InterfaceHandle, InterfaceProxy, MethodStub};
use crate::transport::HttpTransport;
use bimjson_core::{
    decode_response, encode_request, InterfaceDescriptor, MethodDescriptor, ParameterDescriptor,
    RpcError, ServerInfo,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// The meta-interface every server exposes for discovery.
const META_INTERFACE: &str = "MetaInterface";

/// Short name of the authentication interface under the modern scheme.
const AUTH_INTERFACE: &str = "AuthInterface";

/// Prefix the legacy (1.4-era) naming scheme puts on interface names.
const LEGACY_PREFIX: &str = "Bimsie1";

/// Parameter metadata (`getServiceMethodParameters`) exists from 1.5.0 on.
const PARAMETER_METADATA_VERSION: (u32, u32, u32) = (1, 5, 0);

/// Which of the two historical interface-naming schemes the server uses.
/// Detected once at discovery: a server reporting `Bimsie1AuthInterface`
/// is legacy, everything else is modern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    /// 1.4-era servers, interface names carry the `Bimsie1` prefix.
    Legacy,
    /// 1.5 and later, unprefixed names.
    Modern,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server address; scheme and the `/json` sub-path are filled in.
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8082".to_string(),
            username: None,
            password: None,
            timeout_ms: 30000,
        }
    }
}

impl SessionConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// A connected session. Interfaces and methods are discovered during
/// [`Session::connect`] and fixed for the session's lifetime; the token is
/// written once at login and attached to every later request. All methods
/// take `&self` after construction.
#[derive(Debug)]
pub struct Session {
    transport: HttpTransport,
    token: Option<String>,
    naming: NamingScheme,
    interfaces: IndexMap<String, InterfaceProxy>,
}

impl Session {
    /// Connect without credentials.
    pub fn open(address: &str) -> Result<Self, RpcError> {
        Self::connect(SessionConfig::new(address))
    }

    /// Connect and log in. Fails with `Authentication` if the server
    /// rejects the credentials.
    pub fn open_with_credentials(
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, RpcError> {
        Self::connect(SessionConfig::new(address).with_credentials(username, password))
    }

    /// Build a session: discover interfaces, detect the naming scheme,
    /// bind one proxy per interface, then log in when credentials were
    /// supplied. A failure in discovery or login aborts construction; a
    /// failure of the server-version probe only disables parameter
    /// metadata for this session.
    pub fn connect(config: SessionConfig) -> Result<Self, RpcError> {
        let transport = HttpTransport::new(&config.address, config.timeout_ms)?;
        debug!("connecting to {}", transport.url());

        let mut session = Session {
            transport,
            token: None,
            naming: NamingScheme::Modern,
            interfaces: IndexMap::new(),
        };

        let descriptors = session.discover_interfaces()?;
        session.naming = detect_naming(&descriptors);
        debug!(
            "discovered {} interfaces, {:?} naming",
            descriptors.len(),
            session.naming
        );

        let (major, minor, revision) = PARAMETER_METADATA_VERSION;
        let with_parameters = match session.minimum_server_version(major, minor, revision) {
            Ok(available) => available,
            Err(err) => {
                warn!("server info probe failed, parameter metadata disabled: {}", err);
                false
            }
        };

        for descriptor in &descriptors {
            let proxy =
                session.bind_interface(&descriptor.simple_name, &descriptor.name, with_parameters)?;
            session
                .interfaces
                .insert(descriptor.simple_name.clone(), proxy);
        }

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            if !username.is_empty() && !password.is_empty() {
                session.authenticate(username, password)?;
            }
        }

        Ok(session)
    }

    /// The normalized endpoint URL this session talks to.
    pub fn url(&self) -> &str {
        self.transport.url()
    }

    /// The auth token, present after a successful login.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    /// Short names of every discovered interface, in reported order.
    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceProxy> {
        self.interfaces.values()
    }

    /// Look up an interface by name, translating between the legacy and
    /// modern naming schemes when the verbatim name is not found. Both
    /// spellings of a name resolve to the same proxy.
    pub fn interface(&self, name: &str) -> Result<InterfaceHandle<'_>, RpcError> {
        self.resolve(name)
            .map(|proxy| InterfaceHandle::new(self, proxy))
    }

    fn resolve(&self, name: &str) -> Result<&InterfaceProxy, RpcError> {
        if let Some(proxy) = self.interfaces.get(name) {
            return Ok(proxy);
        }

        // Translate at most once, in the one direction the naming scheme
        // allows; the two branches are mutually exclusive.
        let translated = match self.naming {
            NamingScheme::Legacy if !name.starts_with(LEGACY_PREFIX) => {
                Some(format!("{}{}", LEGACY_PREFIX, name))
            }
            NamingScheme::Modern if name.starts_with(LEGACY_PREFIX) => {
                Some(name[LEGACY_PREFIX.len()..].to_string())
            }
            _ => None,
        };
        if let Some(translated) = translated {
            if let Some(proxy) = self.interfaces.get(&translated) {
                return Ok(proxy);
            }
        }

        Err(RpcError::UnknownInterface(name.to_string()))
    }

    /// Generic escape hatch: one blocking round trip, bypassing the proxy
    /// tree. The interface name is sent as given, the token merged in when
    /// present.
    pub fn invoke(
        &self,
        interface: &str,
        method: &str,
        parameters: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        debug!("invoke {}.{}", interface, method);
        let body = encode_request(interface, method, parameters, self.token.as_deref())?;
        let text = self.transport.post(body)?;
        decode_response(&text)
    }

    /// Check the server version against a required minimum, every
    /// component compared independently with >=. Errors from the
    /// underlying `getServerInfo` call propagate to the caller of this
    /// check only.
    pub fn minimum_server_version(
        &self,
        major: u32,
        minor: u32,
        revision: u32,
    ) -> Result<bool, RpcError> {
        let value = self.invoke(META_INTERFACE, "getServerInfo", Map::new())?;
        let info: ServerInfo = serde_json::from_value(value)
            .map_err(|e| RpcError::protocol(format!("malformed server info: {}", e)))?;
        Ok(info.version.at_least(major, minor, revision))
    }

    fn discover_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, RpcError> {
        let value = self.invoke(META_INTERFACE, "getServiceInterfaces", Map::new())?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::protocol(format!("malformed interface list: {}", e)))
    }

    /// Bind one proxy: fetch the interface's method list and, when the
    /// server is new enough, each method's parameter descriptors.
    fn bind_interface(
        &self,
        short_name: &str,
        full_name: &str,
        with_parameters: bool,
    ) -> Result<InterfaceProxy, RpcError> {
        let mut parameters = Map::new();
        parameters.insert(
            "serviceInterfaceName".to_string(),
            Value::String(full_name.to_string()),
        );
        let value = self.invoke(META_INTERFACE, "getServiceMethods", parameters)?;
        let descriptors: Vec<MethodDescriptor> = serde_json::from_value(value).map_err(|e| {
            RpcError::protocol(format!("malformed method list for {}: {}", full_name, e))
        })?;

        let mut stubs = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let parameter_descriptors = if with_parameters {
                Some(self.fetch_parameters(full_name, &descriptor.name)?)
            } else {
                None
            };
            stubs.push(MethodStub::new(descriptor, parameter_descriptors));
        }
        Ok(InterfaceProxy::new(short_name.to_string(), stubs))
    }

    fn fetch_parameters(
        &self,
        full_name: &str,
        method_name: &str,
    ) -> Result<Vec<ParameterDescriptor>, RpcError> {
        let mut parameters = Map::new();
        parameters.insert(
            "serviceInterfaceName".to_string(),
            Value::String(full_name.to_string()),
        );
        parameters.insert(
            "serviceMethodName".to_string(),
            Value::String(method_name.to_string()),
        );
        let value = self.invoke(META_INTERFACE, "getServiceMethodParameters", parameters)?;
        serde_json::from_value(value).map_err(|e| {
            RpcError::protocol(format!(
                "malformed parameter list for {}.{}: {}",
                full_name, method_name, e
            ))
        })
    }

    /// Log in and store the token. Runs once, during construction; any
    /// failure between "credentials supplied" and "token stored" is an
    /// authentication error.
    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), RpcError> {
        let auth_name = self
            .resolve(AUTH_INTERFACE)
            .map(|proxy| proxy.name().to_string())
            .map_err(|_| RpcError::authentication("no auth interface on this server"))?;

        let mut parameters = Map::new();
        parameters.insert("username".to_string(), Value::String(username.to_string()));
        parameters.insert("password".to_string(), Value::String(password.to_string()));

        let value = match self.invoke(&auth_name, "login", parameters) {
            Ok(value) => value,
            Err(RpcError::Remote(message)) => return Err(RpcError::authentication(message)),
            Err(other) => return Err(other),
        };

        match value {
            Value::String(token) if !token.is_empty() => {
                debug!("logged in as {}", username);
                self.token = Some(token);
                Ok(())
            }
            other => Err(RpcError::authentication(format!(
                "login returned no usable token: {}",
                other
            ))),
        }
    }
}

fn detect_naming(descriptors: &[InterfaceDescriptor]) -> NamingScheme {
    let legacy_auth = format!("{}{}", LEGACY_PREFIX, AUTH_INTERFACE);
    if descriptors.iter().any(|d| d.simple_name == legacy_auth) {
        NamingScheme::Legacy
    } else {
        NamingScheme::Modern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::InterfaceProxy;

    fn descriptor(simple_name: &str) -> InterfaceDescriptor {
        InterfaceDescriptor {
            simple_name: simple_name.to_string(),
            name: format!("org.bimserver.{}", simple_name),
        }
    }

    fn offline_session(naming: NamingScheme, interface_names: &[&str]) -> Session {
        let interfaces = interface_names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    InterfaceProxy::new(name.to_string(), Vec::new()),
                )
            })
            .collect();
        Session {
            transport: HttpTransport::new("localhost", 1000).unwrap(),
            token: None,
            naming,
            interfaces,
        }
    }

    #[test]
    fn test_detect_naming_legacy() {
        let descriptors = vec![
            descriptor("Bimsie1AuthInterface"),
            descriptor("Bimsie1ServiceInterface"),
        ];
        assert_eq!(detect_naming(&descriptors), NamingScheme::Legacy);
    }

    #[test]
    fn test_detect_naming_modern() {
        let descriptors = vec![descriptor("AuthInterface"), descriptor("ServiceInterface")];
        assert_eq!(detect_naming(&descriptors), NamingScheme::Modern);
    }

    #[test]
    fn test_resolve_verbatim_name() {
        let session = offline_session(NamingScheme::Modern, &["ServiceInterface"]);
        assert_eq!(
            session.resolve("ServiceInterface").unwrap().name(),
            "ServiceInterface"
        );
    }

    #[test]
    fn test_resolve_adds_legacy_prefix() {
        let session = offline_session(NamingScheme::Legacy, &["Bimsie1ServiceInterface"]);
        assert_eq!(
            session.resolve("ServiceInterface").unwrap().name(),
            "Bimsie1ServiceInterface"
        );
    }

    #[test]
    fn test_resolve_strips_legacy_prefix() {
        let session = offline_session(NamingScheme::Modern, &["ServiceInterface"]);
        assert_eq!(
            session.resolve("Bimsie1ServiceInterface").unwrap().name(),
            "ServiceInterface"
        );
    }

    #[test]
    fn test_resolve_same_proxy_for_both_spellings() {
        let session = offline_session(NamingScheme::Modern, &["ServiceInterface"]);
        let direct = session.resolve("ServiceInterface").unwrap();
        let translated = session.resolve("Bimsie1ServiceInterface").unwrap();
        assert!(std::ptr::eq(direct, translated));
    }

    #[test]
    fn test_resolve_unknown_in_both_forms() {
        let session = offline_session(NamingScheme::Modern, &["ServiceInterface"]);
        let err = session.resolve("PluginInterface").unwrap_err();
        assert!(matches!(err, RpcError::UnknownInterface(name) if name == "PluginInterface"));
    }

    #[test]
    fn test_resolve_never_double_translates() {
        // A legacy session asked for an already-prefixed unknown name must
        // not try to prefix it again.
        let session = offline_session(NamingScheme::Legacy, &["Bimsie1ServiceInterface"]);
        let err = session.resolve("Bimsie1PluginInterface").unwrap_err();
        assert!(matches!(err, RpcError::UnknownInterface(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::new("bim.example.org").with_credentials("u", "p");
        assert_eq!(config.address, "bim.example.org");
        assert_eq!(config.username.as_deref(), Some("u"));
        assert_eq!(config.password.as_deref(), Some("p"));
        assert_eq!(config.timeout_ms, SessionConfig::default().timeout_ms);
    }
}
