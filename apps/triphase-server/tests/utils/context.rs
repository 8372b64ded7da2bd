use indoc::formatdoc;
use tokio::task::JoinHandle;
use triphase_core::TriphaseCore;
use triphase_core::config::core_config::TriphaseConfig;
use triphase_server::ServerConfig;
use triphase_server::router::start_server;

use super::api_client::Client;

pub const VERIFICATION_KEY: &str = "integration-test-key";
pub const ALLOW_ORIGIN: &str = "https://signer.triphase.test";

pub struct TestContext {
    pub api: Client,
    _handle: JoinHandle<std::io::Result<()>>,
}

impl TestContext {
    pub async fn new() -> Self {
        let properties = formatdoc! {"
            document.manager=inline
            verification.key={VERIFICATION_KEY}
            Access-Control-Allow-Origin={ALLOW_ORIGIN}
            signed.document.delivery=inline
            batch.timeoutSeconds=10
        "};

        Self::new_with_properties(&properties, Some(VERIFICATION_KEY)).await
    }

    pub async fn new_with_properties(properties: &str, key: Option<&str>) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let config = TriphaseConfig::parse(properties, |_| None).unwrap();
        let core = TriphaseCore::new(config).unwrap();

        let _handle =
            tokio::spawn(async move { start_server(listener, core, ServerConfig::default()).await });

        Self {
            api: Client::new(base_url, key.map(ToOwned::to_owned)),
            _handle,
        }
    }
}
