use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Client CLI for the transaction relay", long_about = None)]
struct Cli {
    /// Relay base URL
    #[arg(short, long, default_value = "ws://localhost:8080")]
    url: String,

    /// Session address to connect as
    #[arg(short, long)]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one transaction and wait for its response
    Send {
        /// Destination address (0x-prefixed)
        #[arg(long)]
        to: String,

        /// Value in wei, hex-encoded
        #[arg(long, default_value = "0x0")]
        value: String,

        /// Call data, hex-encoded
        #[arg(long, default_value = "0x")]
        input: String,

        /// Correlation id
        #[arg(long, default_value_t = 1)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            to,
            value,
            input,
            id,
        } => {
            let endpoint = format!("{}/relay/{}", cli.url, cli.address);
            let (mut socket, _) = connect_async(endpoint.as_str()).await?;

            let request = serde_json::json!({
                "id": id,
                "type": "sendTransaction",
                "to": to,
                "value": value,
                "input": input,
            });
            socket.send(Message::Text(request.to_string().into())).await?;

            while let Some(message) = socket.next().await {
                match message? {
                    Message::Text(text) => {
                        let response: serde_json::Value = serde_json::from_str(text.as_str())?;
                        println!("{}", serde_json::to_string_pretty(&response)?);
                        break;
                    }
                    Message::Close(_) => {
                        eprintln!("Error: relay closed the connection");
                        break;
                    }
                    _ => continue,
                }
            }

            socket.close(None).await.ok();
        }
    }

    Ok(())
}
