use std::sync::Arc;

use tracing::info;

use crate::api::ApiClient;
use crate::config::Config;
use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::draft_store::{DraftSlot, DraftStore};
use crate::endpoint::EndpointResolver;
use crate::errors::ClientError;
use crate::request::RequestClient;
use crate::router::{Navigation, Navigator, RouteTable};

/// Landing screen after a successful login.
pub const HOME_PATH: &str = "/MainLayout/Home";

/// Everything a screen needs, wired around one shared credential store.
pub struct Session {
    config: Config,
    credentials: Arc<dyn CredentialStore>,
    api: ApiClient,
    endpoints: EndpointResolver,
    drafts: Arc<dyn DraftSlot>,
    navigator: Navigator,
}

impl Session {
    /// File-backed credentials and drafts under `config.data_dir`.
    pub fn open(config: Config) -> Result<Self, ClientError> {
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(&config.data_dir));
        let drafts: Arc<dyn DraftSlot> = Arc::new(DraftStore::new(&config.data_dir));
        Self::with_parts(config, credentials, drafts)
    }

    pub fn with_parts(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        drafts: Arc<dyn DraftSlot>,
    ) -> Result<Self, ClientError> {
        let request = RequestClient::new(config.api_base_url.clone(), Arc::clone(&credentials))?;
        let api = ApiClient::new(request, Arc::clone(&credentials));
        let endpoints = EndpointResolver::new(
            config.realtime_base().map(String::from),
            Arc::clone(&credentials),
        );
        let navigator = Navigator::new(RouteTable::interview_app(), Arc::clone(&credentials));

        Ok(Self {
            config,
            credentials,
            api,
            endpoints,
            drafts,
            navigator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn endpoints(&self) -> &EndpointResolver {
        &self.endpoints
    }

    pub fn drafts(&self) -> &dyn DraftSlot {
        self.drafts.as_ref()
    }

    pub fn navigator(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_present()
    }

    /// Logs in and moves to the home screen. Any earlier destination is not resumed.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Navigation, ClientError> {
        self.api.login(username, password).await?;
        Ok(self.navigator.navigate(HOME_PATH))
    }

    /// Drops the credential, returns to the login screen, then drops any staged résumé.
    /// A failure to clear the draft is reported after the user is already on the login screen.
    pub async fn logout(&mut self) -> Result<Navigation, ClientError> {
        self.credentials.clear()?;
        let navigation = self.navigator.navigate(crate::router::LOGIN_PATH);
        info!("Logged out");
        self.drafts.clear().await?;
        Ok(navigation)
    }
}
