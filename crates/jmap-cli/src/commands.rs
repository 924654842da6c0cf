//! Subcommand implementations.

use anyhow::{anyhow, Context};
use futures_util::stream::{self, StreamExt};
use jmap_client::{HeaderMap, JmapClient};
use jmap_config_and_utils::ClientConfig;
use jmap_protocol_types::{EntityType, MethodName};
use jmap_push::PushMultiplexer;
use serde_json::Value;
use tracing::info;

async fn connect(config: &ClientConfig) -> anyhow::Result<JmapClient> {
    let client = JmapClient::new(config)?;
    client
        .fetch_session(&HeaderMap::new())
        .await
        .with_context(|| format!("fetching session from {}", config.session_url))?;
    Ok(client)
}

/// `jmap session`
pub async fn session(config: &ClientConfig) -> anyhow::Result<()> {
    let client = connect(config).await?;
    let session = client.session().current()?;
    println!("{}", serde_json::to_string_pretty(session.as_ref())?);
    Ok(())
}

/// `jmap call <method> --args <json>`
pub async fn call(config: &ClientConfig, method: &str, args: &str) -> anyhow::Result<()> {
    let method: MethodName = method.parse().map_err(|e: String| anyhow!(e))?;
    let args: Value = serde_json::from_str(args).context("--args is not valid JSON")?;

    let client = connect(config).await?;
    let result = client.call(method, &args).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Parse entity type names; an empty list means every type.
fn parse_types(names: &[String]) -> anyhow::Result<Vec<EntityType>> {
    if names.is_empty() {
        return Ok(EntityType::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| EntityType::parse(name).ok_or_else(|| anyhow!("unknown entity type: {name}")))
        .collect()
}

/// `jmap watch [types...]`
pub async fn watch(config: &ClientConfig, names: &[String]) -> anyhow::Result<()> {
    let types = parse_types(names)?;
    let client = connect(config).await?;
    let push = PushMultiplexer::new(client);

    let mut changes = stream::select_all(types.iter().map(|&entity| {
        push.stream_for(entity)
            .map(move |event| (entity, event))
            .boxed()
    }));

    push.start().await?;
    info!(types = ?types, "Watching for state changes");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            change = changes.next() => match change {
                Some((entity, Ok(states))) => {
                    for (account_id, state) in states {
                        println!("{entity}\t{account_id}\t{state}");
                    }
                }
                Some((_, Err(e))) => return Err(e.into()),
                None => {
                    info!("Push connection closed");
                    return Ok(());
                }
            },
            _ = &mut ctrl_c => {
                info!("Received shutdown signal, closing push connection");
                push.stop();
                return Ok(());
            }
        }
    }
}
