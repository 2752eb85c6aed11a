// BIMserver JSON API client.
//
// Interfaces are discovered from the server at session construction and
// exposed as proxies whose methods take named arguments:
//
//     let session = Session::open_with_credentials(
//         "bimserver.example.org:8082", "admin@example.org", "secret")?;
//     let project = session
//         .interface("ServiceInterface")?
//         .call("addProject")?
//         .arg("projectName", "My new project")
//         .send()?;
//
// The same code works against servers using the historical `Bimsie1`
// interface-naming scheme; the session translates names in both directions.

pub mod interface;
pub mod session;
pub mod transport;

pub use bimjson_core::RpcError;
pub use interface::{InterfaceHandle, InterfaceProxy, MethodCall, MethodStub, ParameterSpec};
pub use session::{NamingScheme, Session, SessionConfig};
pub use transport::HttpTransport;
