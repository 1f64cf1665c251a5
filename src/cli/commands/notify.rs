use clap::Subcommand;

use crate::cli::{print_json, OutputFormat};
use crate::functions::{EmailRequest, SmsRequest};
use crate::notify::{DeliveryReport, NotificationClient};

#[derive(Subcommand)]
pub enum NotifyCommands {
    #[command(about = "Send an SMS")]
    Sms {
        #[arg(help = "Phone number")]
        to: String,
        #[arg(help = "Message text")]
        message: String,
    },

    #[command(about = "Send an email")]
    Email {
        #[arg(help = "Email address")]
        to: String,
        #[arg(long, help = "Subject line")]
        subject: String,
        #[arg(long, help = "Plain text body")]
        body: String,
    },
}

pub async fn handle(cmd: NotifyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = NotificationClient::from_config();

    let report = match cmd {
        NotifyCommands::Sms { to, message } => {
            client.send_sms(&SmsRequest { to, message, job_id: None }).await
        }
        NotifyCommands::Email { to, subject, body } => {
            client
                .send_email(&EmailRequest { to, subject, body: Some(body), html: None })
                .await
        }
    };

    print_report(&report, output_format)
}

fn print_report(report: &DeliveryReport, output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Text => {
            if report.success {
                println!(
                    "Sent {} to {}",
                    report.message_id.as_deref().unwrap_or("-"),
                    report.recipient.as_deref().unwrap_or("-")
                );
            } else {
                // Best effort: a failed notification is reported, not fatal
                println!("Not sent: {}", report.error.as_deref().unwrap_or("unknown error"));
            }
            Ok(())
        }
    }
}
