use std::sync::Arc;

use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::notification::webhook::WebhookNotifier;
use crate::pass::PassIssuer;
use crate::repo::Repository;
use crate::store::DocumentStore;
use crate::workflow::ApprovalWorkflow;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub repo: Repository,
    pub workflow: ApprovalWorkflow,
    pub passes: PassIssuer,
    pub sessions: SessionStore,
    pub webhook: WebhookNotifier,
    pub config: Config,
}

impl AppState {
    /// Wire every service onto one injected store handle.
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            workflow: ApprovalWorkflow::new(store.clone()),
            passes: PassIssuer::new(&config.pass_secret),
            sessions: SessionStore::new(store, config.session_ttl_secs),
            webhook: WebhookNotifier::new(
                config.webhook_urls.clone(),
                config.webhook_secret.clone(),
            ),
            config,
        }
    }
}
