//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::TcpListener;

use attribute_routing::config::RoutingConfig;
use attribute_routing::http::{HandlerRegistry, HttpServer};
use attribute_routing::lifecycle::{bootstrap, Application, Shutdown};
use attribute_routing::HandlerCatalog;

/// Handler manifest shared by the integration tests.
pub const MANIFEST: &str = r#"
[[classes]]
name = 'App\Http\Controllers\Utils\PingController'

[[classes.methods]]
name = "ping"

[[classes.methods]]
name = "pong"

[[classes.methods]]
name = "secret"
visibility = "private"

[[classes]]
name = 'App\Http\Controllers\Admin\UserController'

[[classes.attributes]]
kind = "prefix"
prefix = "admin"

[[classes.attributes]]
kind = "middleware"
middleware = ["auth"]

[[classes.attributes]]
kind = "where"
param = "user"
constraint = "[0-9]+"

[[classes.methods]]
name = "show"

[[classes.methods.attributes]]
kind = "route"
verbs = ["GET"]
uri = "users/{user}"
name = "users.show"

[[classes.methods]]
name = "update"

[[classes.methods.attributes]]
kind = "route"
verbs = ["PUT"]
uri = "users/{user}"
without_middleware = ["auth"]

[[classes]]
name = 'App\Http\Controllers\PhotoController'

[[classes.attributes]]
kind = "resource"
resource = "photos"
only = ["index", "show"]

[[classes.methods]]
name = "index"

[[classes.methods.attributes]]
kind = "route"
verbs = ["GET"]
uri = "ignored"
"#;

/// A scratch directory removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("attribute-routing-{label}-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Create an empty file (and its parents) relative to the directory.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let file = self.0.join(relative);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "").unwrap();
        file
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let file = self.0.join(relative);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, content).unwrap();
        file
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// A handler tree matching [`MANIFEST`], plus a config pointing at it.
pub fn handler_tree(label: &str) -> (TempDir, RoutingConfig) {
    let dir = TempDir::new(label);
    dir.touch("app/Http/Controllers/Utils/PingController.rs");
    dir.touch("app/Http/Controllers/Admin/UserController.rs");
    dir.touch("app/Http/Controllers/PhotoController.rs");
    dir.touch("app/Http/Controllers/README.md");
    let manifest = dir.write("handlers.toml", MANIFEST);

    let controllers = dir.path().join("app/Http/Controllers");
    let config_text = format!(
        r#"
[routing]
catalog = '{catalog}'

[[routing.directories]]
path = '{controllers}'
namespace = 'App\Http\Controllers'
"#,
        catalog = manifest.display(),
        controllers = controllers.display(),
    );
    let config = attribute_routing::config::parse_config(&config_text).unwrap();
    (dir, config)
}

pub fn catalog() -> HandlerCatalog {
    HandlerCatalog::from_toml(MANIFEST).unwrap()
}

/// A running server on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub app: Application,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server(config: RoutingConfig, catalog: HandlerCatalog, handlers: HandlerRegistry) -> TestServer {
    let app = bootstrap(config, catalog);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(&app, handlers);
    let wait = shutdown.wait();
    tokio::spawn(async move {
        let _ = server.run(listener, wait).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer { addr, app, shutdown }
}
