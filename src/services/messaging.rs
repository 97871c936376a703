use chrono::Utc;
use reqwest::Client;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::outbox::MessageTemplate;
use crate::services::conversation_fsm::{self, ConversationOutcome};
use crate::services::pii_vault::PiiVault;
use crate::services::tasks::TaskDispatcher;
use crate::whatsapp::outbound::{self, EvolutionCredentials, MetaCredentials};
use crate::whatsapp::templates;

/// Handles a dequeued `whatsapp.send_message` task.
///
/// The outbox only ever carries a [`MessageTemplate`] and a
/// `contact_hash` — never a remote address or rendered text — so this
/// is the one place that pulls both together: the address comes out of
/// [`PiiVault::fetch`], the text is rendered here from the template, and
/// neither is ever persisted afterward.
///
/// A vault miss (TTL lapsed since the last inbound message, or the
/// contact never messaged this channel) is logged and treated as a
/// non-retryable failure — no rendering decision the FSM made can
/// recover a remote address that no longer exists, and retrying will
/// only encounter the same miss.
pub async fn send_whatsapp_message(
    http_client: &Client,
    config: &AppConfig,
    pii_vault: &PiiVault,
    pool: &PgPool,
    property_id: Uuid,
    contact_hash: &str,
    channel: &str,
    template: &MessageTemplate,
    correlation_id: Option<&str>,
) -> AppResult<()> {
    let Some(remote_address) = pii_vault.fetch(pool, property_id, channel, contact_hash).await? else {
        return Err(AppError::Gone(format!(
            "no remote address on file for contact_hash {contact_hash} on channel {channel}"
        )));
    };

    let text = templates::render(template);
    let correlation_id = correlation_id.unwrap_or("");

    match channel {
        "evolution" => {
            let credentials = evolution_credentials(config)?;
            outbound::send_text_via_evolution(http_client, &credentials, &remote_address, &text, correlation_id)
                .await
        }
        "meta" => {
            let credentials = meta_credentials(config)?;
            outbound::send_text_via_meta(http_client, &credentials, &remote_address, &text, correlation_id).await
        }
        other => Err(AppError::ConfigurationMissing(format!("unknown whatsapp channel: {other}"))),
    }
}

fn evolution_credentials(config: &AppConfig) -> AppResult<EvolutionCredentials> {
    let base_url = config
        .whatsapp_evolution_base_url
        .clone()
        .ok_or_else(|| AppError::ConfigurationMissing("WHATSAPP_EVOLUTION_BASE_URL is not set".to_string()))?;
    let instance = config
        .whatsapp_evolution_instance
        .clone()
        .ok_or_else(|| AppError::ConfigurationMissing("WHATSAPP_EVOLUTION_INSTANCE is not set".to_string()))?;
    let api_key = config
        .whatsapp_evolution_api_key
        .clone()
        .ok_or_else(|| AppError::ConfigurationMissing("WHATSAPP_EVOLUTION_API_KEY is not set".to_string()))?;
    Ok(EvolutionCredentials { base_url, instance, api_key })
}

fn meta_credentials(config: &AppConfig) -> AppResult<MetaCredentials> {
    let phone_number_id = config
        .whatsapp_meta_phone_number_id
        .clone()
        .ok_or_else(|| AppError::ConfigurationMissing("WHATSAPP_META_PHONE_NUMBER_ID is not set".to_string()))?;
    let access_token = config
        .whatsapp_meta_access_token
        .clone()
        .ok_or_else(|| AppError::ConfigurationMissing("WHATSAPP_META_ACCESS_TOKEN is not set".to_string()))?;
    Ok(MetaCredentials {
        phone_number_id,
        access_token,
        graph_api_version: config.whatsapp_meta_graph_api_version.clone(),
    })
}

/// Handles a dequeued `conversations.handle_inbound` task.
///
/// `TaskPayload::HandleInboundConversation` deliberately carries no
/// message text — only `message_id` — so the first thing this does is
/// pull the stashed plaintext back out of the vault. A missing or
/// already-consumed entry means a duplicate task delivery arrived after
/// another worker already ran this message to completion; that's a
/// quiet no-op rather than an error, since retrying a second time would
/// otherwise double-advance the conversation.
#[allow(clippy::too_many_arguments)]
pub async fn handle_inbound(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    pii_vault: &PiiVault,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
    message_id: &str,
    correlation_id: Option<Uuid>,
) -> AppResult<Option<ConversationOutcome>> {
    let Some(text) = pii_vault.take_inbound_text(pool, property_id, message_id).await? else {
        tracing::info!(
            property_id = %property_id,
            message_id,
            "inbound message text already consumed or expired, skipping"
        );
        return Ok(None);
    };

    let reference_date = Utc::now().date_naive();
    let outcome = conversation_fsm::handle_inbound_message(
        pool,
        tasks,
        property_id,
        channel,
        contact_hash,
        &text,
        reference_date,
        correlation_id,
    )
    .await?;

    Ok(Some(outcome))
}
