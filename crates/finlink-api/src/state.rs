//! Application state.

use std::sync::Arc;

use finlink_realtime::ChangeFeed;
use finlink_supabase::{
    AuthAdminClient, ConnectionRequestRepo, MessageRepo, NotificationLogRepo, NotificationRepo,
    ProfileRepo, SupabaseClient, UserRoleRepo, VerificationRepo,
};

use crate::config::ApiConfig;
use crate::services::{EmailSender, GeocodeClient, NotificationDispatcher};
use crate::session::TokenVerifier;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub supabase: SupabaseClient,
    pub profiles: ProfileRepo,
    pub messages: MessageRepo,
    pub notifications: NotificationRepo,
    pub roles: UserRoleRepo,
    pub connections: ConnectionRequestRepo,
    pub verifications: VerificationRepo,
    pub logs: NotificationLogRepo,
    pub auth_admin: AuthAdminClient,
    pub feed: Arc<ChangeFeed>,
    pub verifier: Arc<TokenVerifier>,
    pub dispatcher: NotificationDispatcher,
    pub email: EmailSender,
    pub geocode: GeocodeClient,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let supabase = SupabaseClient::from_env()?;
        let feed = Arc::new(ChangeFeed::from_env()?);
        let verifier = Arc::new(TokenVerifier::from_env()?);

        let profiles = ProfileRepo::new(supabase.clone());
        let messages = MessageRepo::new(supabase.clone());
        let notifications = NotificationRepo::new(supabase.clone());
        let roles = UserRoleRepo::new(supabase.clone());
        let connections = ConnectionRequestRepo::new(supabase.clone());
        let verifications = VerificationRepo::new(supabase.clone());
        let logs = NotificationLogRepo::new(supabase.clone());
        let auth_admin = AuthAdminClient::new(supabase.clone());

        let dispatcher = NotificationDispatcher::new(
            profiles.clone(),
            notifications.clone(),
            logs.clone(),
            Arc::clone(&feed),
            config.webhooks.clone(),
        );
        let email = EmailSender::new(&config, logs.clone());
        let geocode = GeocodeClient::new(&config);

        Ok(Self {
            config,
            supabase,
            profiles,
            messages,
            notifications,
            roles,
            connections,
            verifications,
            logs,
            auth_admin,
            feed,
            verifier,
            dispatcher,
            email,
            geocode,
        })
    }
}
