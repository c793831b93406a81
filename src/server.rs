use crate::{
    api,
    config::Config,
    db::{DbExecutor, VoteStore},
    error::VoteError,
    services::{session::SessionActor, vote::VoteActor},
};
use actix::prelude::*;
use actix::registry::SystemRegistry;
use actix_web::web;
use std::sync::Arc;

pub fn register_db_actor(store: Arc<dyn VoteStore>) {
    SystemRegistry::set(DbExecutor::new(store).start());
}

pub fn register_system_actors(config: &Config) {
    SystemRegistry::set(
        SessionActor::new(config.admin_identity.clone(), config.session_ttl).start(),
    );
    SystemRegistry::set(VoteActor::new().start());
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| VoteError::MalformedPayload(err.to_string()).into());

    cfg.app_data(json_config)
        .route("/login", web::post().to(api::login))
        .route("/vote", web::post().to(api::vote))
        .route("/admin/votes", web::get().to(api::admin_votes))
        .route("/parties", web::get().to(api::parties))
        .route("/health", web::get().to(api::health));
}
