//! Key utility for the Nostr gateway.
//!
//! Generates signing keys for `NOSTR_PRIVATE_KEY`, derives the public key of
//! an existing one and checks signed events.

use clap::{Parser, Subcommand};
use nostr_gateway::crypto::{SchnorrSigner, Signer, SigningIdentity};
use nostr_gateway::nostr::Event;
use secp256k1::SecretKey;

#[derive(Parser)]
#[command(name = "nostr-keygen")]
#[command(about = "Key utility for the Nostr gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new secret key
    Generate,

    /// Print the public key for a secret key
    Pubkey {
        /// Secret key as 64 hex characters
        secret: String,
    },

    /// Check the id and signature of a signed event
    Verify {
        /// Path to a JSON file holding the event
        #[arg(short, long)]
        file: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let signer = SchnorrSigner::new();

    match cli.command {
        Commands::Generate => {
            let secret_key = SecretKey::new(&mut rand::thread_rng());
            let identity = SigningIdentity::new(secret_key, &signer);
            println!("NOSTR_PRIVATE_KEY={}", hex::encode(secret_key.secret_bytes()));
            println!("Public key: {}", identity.public_key());
        }
        Commands::Pubkey { secret } => {
            let identity = SigningIdentity::from_hex(&secret, &signer)?;
            println!("{}", identity.public_key());
        }
        Commands::Verify { file } => {
            let json = std::fs::read_to_string(&file)?;
            let event: Event = serde_json::from_str(&json)?;
            let expected_id = signer.hash(&event.clone().into())?;

            if expected_id != event.id {
                anyhow::bail!("Event id does not match its content (expected {})", expected_id);
            }
            if !signer.verify(&event)? {
                anyhow::bail!("Signature is not valid for pubkey {}", event.pubkey);
            }
            println!("Event {} is valid", event.id);
        }
    }

    Ok(())
}
