use axum::extract::FromRef;

use crate::contact::ContactService;
use crate::github::GithubClient;
use crate::mirror::MirrorService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedMirrorService = Arc<MirrorService>;
pub type GuardedContactService = Arc<ContactService>;
pub type GuardedGithubClient = Arc<GithubClient>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub mirror: GuardedMirrorService,
    pub contact: GuardedContactService,
    pub github: GuardedGithubClient,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedMirrorService {
    fn from_ref(input: &ServerState) -> Self {
        input.mirror.clone()
    }
}

impl FromRef<ServerState> for GuardedContactService {
    fn from_ref(input: &ServerState) -> Self {
        input.contact.clone()
    }
}

impl FromRef<ServerState> for GuardedGithubClient {
    fn from_ref(input: &ServerState) -> Self {
        input.github.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
