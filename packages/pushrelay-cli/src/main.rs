use clap::{Parser, Subcommand};
use pushrelay_core::{Diagnostics, Resolver, ResolverConfig};
use pushrelay_sdk::{PushRelayClient, SdkError};
use tracing_subscriber::{EnvFilter, fmt};

mod notification_args;

use notification_args::NotificationArgs;

#[derive(Parser)]
#[command(name = "pushrelay-cli")]
#[command(about = "Pushrelay CLI client")]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a push notification through the relay
    Send {
        #[command(flatten)]
        notification: NotificationArgs,
    },
    /// Show the payload the relay would deliver, without sending
    Preview {
        #[command(flatten)]
        notification: NotificationArgs,
        /// iOS sound used for soundType=custom without an explicit sound
        #[arg(long)]
        ios_custom_sound: Option<String>,
        /// Log every resolution step
        #[arg(long)]
        verbose: bool,
    },
    /// Server health check
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = PushRelayClient::new(&cli.server);

    match cli.command {
        Commands::Send { notification } => {
            let request = notification.to_request()?;
            match client.send_notification(&request).await {
                Ok(response) => {
                    println!("✅ {}", response.message);
                    println!("   Message ID: {}", response.message_id);
                }
                Err(SdkError::TokenInvalid { details }) => {
                    eprintln!("❌ Invalid or unregistered token: {}", details);
                    eprintln!("   💡 Remove this token from your device registry");
                    std::process::exit(2);
                }
                Err(e) => {
                    eprintln!("❌ Failed to send notification: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Preview {
            notification,
            ios_custom_sound,
            verbose,
        } => {
            let mut config = ResolverConfig::default();
            if let Some(sound) = &ios_custom_sound {
                config = config.with_ios_custom_sound(sound);
            }
            if verbose {
                fmt().with_env_filter(EnvFilter::new("info")).init();
                config = config.with_diagnostics(Diagnostics::Verbose);
            }

            let request = notification.to_request()?;
            match Resolver::new(config).resolve(&request) {
                Ok(payload) => {
                    println!("📦 Delivery payload:");
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                Err(e) => {
                    eprintln!("❌ Request rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Health => match client.health().await {
            Ok(true) => {
                println!("✅ Server is healthy and responsive");
            }
            Ok(false) => {
                eprintln!("❌ Server health check failed");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("❌ Server health check failed: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_server() {
        let cli = Cli::try_parse_from(["pushrelay-cli", "health"]).unwrap();

        assert_eq!(cli.server, "http://127.0.0.1:3000");
        assert!(matches!(cli.command, Commands::Health));
    }

    #[test]
    fn test_send_command_parsing() {
        let cli = Cli::try_parse_from([
            "pushrelay-cli",
            "--server",
            "http://localhost:8080",
            "send",
            "--token",
            "tok",
            "--title",
            "测试标题",
            "--body",
            "🚀 Hello World",
            "--sound-type",
            "custom",
            "--android-sound",
            "chime",
            "--data",
            "count=5",
            "--data",
            "kind=alert",
        ])
        .unwrap();

        assert_eq!(cli.server, "http://localhost:8080");
        match cli.command {
            Commands::Send { notification } => {
                assert_eq!(notification.token, "tok");
                assert_eq!(notification.title, "测试标题");
                assert_eq!(notification.body, "🚀 Hello World");
                assert_eq!(notification.sound_type.as_deref(), Some("custom"));
                assert_eq!(notification.android_sound.as_deref(), Some("chime"));
                assert_eq!(notification.data, vec!["count=5", "kind=alert"]);
            }
            _ => panic!("Expected Send command"),
        }
    }

    #[test]
    fn test_send_requires_token_title_body() {
        assert!(Cli::try_parse_from(["pushrelay-cli", "send", "--title", "t", "--body", "b"]).is_err());
        assert!(Cli::try_parse_from(["pushrelay-cli", "send", "--token", "x", "--body", "b"]).is_err());
    }

    #[test]
    fn test_unknown_sound_type_is_rejected() {
        let result = Cli::try_parse_from([
            "pushrelay-cli",
            "send",
            "--token",
            "x",
            "--title",
            "t",
            "--body",
            "b",
            "--sound-type",
            "loud",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_preview_command_parsing() {
        let cli = Cli::try_parse_from([
            "pushrelay-cli",
            "preview",
            "--token",
            "x",
            "--title",
            "t",
            "--body",
            "b",
            "--ios-custom-sound",
            "shockding",
            "--verbose",
        ])
        .unwrap();

        match cli.command {
            Commands::Preview {
                notification,
                ios_custom_sound,
                verbose,
            } => {
                assert_eq!(notification.token, "x");
                assert_eq!(ios_custom_sound.as_deref(), Some("shockding"));
                assert!(verbose);
            }
            _ => panic!("Expected Preview command"),
        }
    }
}
