//! `serve` command: run the bot until interrupted.

use super::build_pipeline;
use crate::config::BuzzwordConfig;
use crate::nostr::{KIND_CHANNEL_MESSAGE, KIND_TEXT_NOTE, Keys, RelayPool};
use crate::publish::{HttpImageRenderer, Publisher, WebSocketDelivery};
use crate::scheduler::{Heartbeat, Session, Supervisor};
use crate::{Error, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Wires every component from `config` and runs the supervisor until Ctrl-C.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if no signing key is configured or it cannot be parsed.
/// - [`Error::ConfigLoad`] if the custom dictionary is malformed.
pub async fn serve(config: &BuzzwordConfig) -> Result<()> {
    let supervisor = build_supervisor(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    supervisor.run(shutdown_rx).await;
    Ok(())
}

fn build_supervisor(config: &BuzzwordConfig) -> Result<Supervisor> {
    let secret = config
        .secret_key
        .as_ref()
        .ok_or_else(|| Error::InvalidInput("BOT_NSEC is required to publish".to_string()))?;
    let keys = Keys::parse(secret.expose_secret())?;
    info!(pubkey = %keys.public_key_hex(), "Signing key loaded");

    let pipeline = build_pipeline(config)?;

    let mut publisher = Publisher::new(
        keys,
        config.relays.publish.clone(),
        Arc::new(WebSocketDelivery::new(config.relays.timeout)),
    )
    .with_topic(config.schedule.trigger_phrase.clone());
    if let Some(endpoint) = &config.render_url {
        publisher = publisher.with_renderer(Arc::new(HttpImageRenderer::new(
            endpoint.clone(),
            config.relays.timeout,
        )));
    }

    let pool = RelayPool::new(
        config.relays.subscribe.clone(),
        vec![KIND_TEXT_NOTE, KIND_CHANNEL_MESSAGE],
        config.relays.timeout,
    );
    info!(
        subscribe = ?pool.relays(),
        publish = ?publisher.relays(),
        "Relays configured"
    );

    let mut session = Session::new(Arc::new(pool), pipeline, Arc::new(publisher))
        .with_schedule(config.schedule.clone())
        .with_policy(config.ranking)
        .with_retention(config.store);
    if let Some(url) = &config.heartbeat_url {
        session = session.with_heartbeat(Heartbeat::new(url.clone(), config.relays.timeout));
    }

    Ok(Supervisor::new(session, config.schedule.session_backoff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_missing_key_is_rejected() {
        let config = BuzzwordConfig::new();
        assert!(matches!(
            build_supervisor(&config),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bad_key_is_rejected() {
        let mut config = BuzzwordConfig::new();
        config.secret_key = Some(SecretString::from("nsec1notakey".to_string()));
        assert!(matches!(
            build_supervisor(&config),
            Err(Error::InvalidInput(_))
        ));
    }
}
