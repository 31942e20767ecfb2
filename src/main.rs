use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_notify::config;
use market_notify::models::{AuthToken, CreateNotification, Metadata, Notification, NotificationType, User};
use market_notify::notification::TracingToaster;
use market_notify::store::{StoreAction, StoreEvent};
use market_notify::{HttpNotificationApi, NotificationConsumer, NotificationStore, StoreOptions};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "market_notify=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut cfg = config::load()?;
    let args = cli::Cli::parse();

    if let Some(url) = args.api_url {
        cfg.api_url = url;
    }
    let token = args
        .token
        .or_else(|| cfg.api_token.clone())
        .and_then(AuthToken::new)
        .context("no credential: pass --token or set MARKET_API_TOKEN")?;

    let api = Arc::new(HttpNotificationApi::from_config(&cfg)?);
    let store = NotificationStore::new(api, StoreOptions::from(&cfg));
    let consumer = NotificationConsumer::new(store.clone(), Arc::new(TracingToaster));

    let result = match args.command {
        Some(cli::Commands::Watch { user }) => watch(&consumer, token, user).await,
        None => watch(&consumer, token, "me".to_string()).await,
        Some(cli::Commands::List { page, all }) => list(&store, &token, page, all).await,
        Some(cli::Commands::Read { id }) => {
            consumer.set_session(Some(token), None).await;
            consumer.mark_as_read(&id).await;
            finish(&consumer, format!("marked {} as read", id))
        }
        Some(cli::Commands::Delete { id }) => {
            consumer.set_session(Some(token), None).await;
            consumer.delete_notification(&id).await;
            finish(&consumer, format!("deleted {}", id))
        }
        Some(cli::Commands::Clear) => {
            consumer.set_session(Some(token), None).await;
            consumer.delete_all_notifications().await;
            finish(&consumer, "deleted all notifications".to_string())
        }
        Some(cli::Commands::Create {
            user,
            content,
            notification_type,
            metadata,
        }) => {
            let notification_type: NotificationType = notification_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let metadata = metadata
                .map(|raw| serde_json::from_str::<Metadata>(&raw))
                .transpose()
                .context("--metadata must be a JSON object")?;
            let input = CreateNotification {
                user_id: user,
                content,
                notification_type,
                metadata,
            };
            consumer.set_session(Some(token), None).await;
            consumer.create_notification(&input).await;
            if let Some(created) = consumer.notifications().first() {
                print_notification(created);
            }
            finish(&consumer, "created notification".to_string())
        }
    };

    drop(consumer);
    store.dispose();

    result
}

/// Report the store's error slot as the command outcome.
fn finish(consumer: &NotificationConsumer, done: String) -> anyhow::Result<()> {
    match consumer.error() {
        Some(err) => anyhow::bail!(err),
        None => {
            println!("{}", done);
            Ok(())
        }
    }
}

async fn list(store: &NotificationStore, token: &AuthToken, page: u32, all: bool) -> anyhow::Result<()> {
    store.fetch_page(token, page).await;
    if all {
        while store.snapshot().has_more && store.error().is_none() {
            store.load_more(token).await;
        }
    }
    if let Some(err) = store.error() {
        anyhow::bail!(err);
    }

    let snapshot = store.snapshot();
    for n in &snapshot.notifications {
        print_notification(n);
    }
    println!(
        "{} shown, {} unread, {} total",
        snapshot.notifications.len(),
        snapshot.unread_count,
        snapshot.total.unwrap_or(0)
    );
    Ok(())
}

async fn watch(consumer: &NotificationConsumer, token: AuthToken, user: String) -> anyhow::Result<()> {
    let mut events = consumer.store().subscribe();
    consumer.set_session(Some(token), Some(User::new(user))).await;
    consumer.mount().await;

    let mut last = (usize::MAX, usize::MAX);
    print_if_changed(consumer, &mut last);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(StoreEvent::Succeeded { action: StoreAction::FetchPage { .. } }) => {
                    print_if_changed(consumer, &mut last);
                }
                Ok(StoreEvent::Failed { message, .. }) => eprintln!("poll failed: {}", message),
                Ok(StoreEvent::PollingStopped) if !consumer.is_polling() => {
                    eprintln!("polling stopped");
                    break;
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    consumer.unmount();
    Ok(())
}

fn print_if_changed(consumer: &NotificationConsumer, last: &mut (usize, usize)) {
    let snapshot = consumer.snapshot();
    let current = (snapshot.notifications.len(), snapshot.unread_count);
    if current == *last {
        return;
    }
    *last = current;
    println!("── {} notifications, {} unread ──", current.0, current.1);
    for n in snapshot.notifications.iter().take(10) {
        print_notification(n);
    }
}

fn print_notification(n: &Notification) {
    let marker = if n.read { ' ' } else { '•' };
    println!(
        "{} {:<12} {:<26} {} {}",
        marker,
        n.id,
        n.notification_type,
        n.created_at.format("%Y-%m-%d %H:%M"),
        n.content
    );
}
