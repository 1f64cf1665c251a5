use anyhow::Context;
use serde_json::json;
use std::sync::Arc;

use crate::auth::Session;
use crate::backend::{Backend, PgBackend};
use crate::cli::OutputFormat;
use crate::permissions::load_permissions;
use crate::services::{TicketAlert, UnreadMessagesService};
use crate::toast::{Notifier, Toast};

/// Prints toasts to stdout
struct ConsoleNotifier {
    output_format: OutputFormat,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        match self.output_format {
            OutputFormat::Json => println!("{}", json!({ "toast": toast })),
            OutputFormat::Text => println!("[{:?}] {}: {}", toast.level, toast.title, toast.message),
        }
    }
}

pub async fn handle(token: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let session = Session::from_token(token).context("invalid access token")?;
    let backend: Arc<dyn Backend> = Arc::new(PgBackend::connect().await.context("cannot reach the backend")?);
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier { output_format });

    let permissions = load_permissions(backend.as_ref(), Some(&session)).await;

    let mut unread = UnreadMessagesService::new(backend.clone(), session.clone(), notifier.clone())
        .on_new_unread(move |message| match output_format {
            OutputFormat::Json => println!("{}", json!({ "new_unread": message })),
            OutputFormat::Text => println!("New message: {}", message.content),
        })
        .on_read(move |message| match output_format {
            OutputFormat::Json => println!("{}", json!({ "read": message.id })),
            OutputFormat::Text => println!("Read: {}", message.id),
        });
    unread.start().await?;

    let mut tickets = TicketAlert::new(backend, session, permissions, notifier);
    tickets.start().await?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "unread": unread.unread_count(), "pending_tickets": tickets.pending() })
        ),
        OutputFormat::Text => println!(
            "{} unread messages, {} pending tickets. Ctrl-C to stop.",
            unread.unread_count(),
            tickets.pending().len()
        ),
    }

    let tickets_expected = tickets.is_subscribed();
    let mut messages_live = true;
    let mut tickets_live = tickets_expected;
    // Only the receive half is raced; events are handled after the race resolves
    while messages_live || tickets_live {
        tokio::select! {
            event = unread.next_event(), if messages_live => match event {
                Some(event) => {
                    if unread.handle_event(&event).is_some() && output_format == OutputFormat::Text {
                        println!("Unread: {}", unread.unread_count());
                    }
                }
                None => messages_live = false,
            },
            event = tickets.next_event(), if tickets_live => match event {
                Some(event) => tickets.handle_event(&event).await,
                None => tickets_live = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    unread.stop();
    tickets.stop();
    if !messages_live || (tickets_expected && !tickets_live) {
        tracing::warn!("Live feed ended; run watch again to resubscribe");
    }
    Ok(())
}
