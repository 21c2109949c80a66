//! SealStream CLI - password-based authenticated file encryption.
//!
//! This tool encrypts and decrypts single files with a password, verifying
//! an authentication tag on decryption so tampering and wrong passwords are
//! detected before any output is produced.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use sealstream_engine::{DecryptOutcome, FileCipher};

#[derive(Parser)]
#[command(name = "sealstream")]
#[command(about = "SealStream - streaming authenticated file encryption")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file.
    Encrypt {
        /// Source file to encrypt.
        input: PathBuf,

        /// Destination for the encrypted file (must not exist).
        output: PathBuf,

        #[command(flatten)]
        options: CipherOptions,
    },

    /// Decrypt a file and verify its authentication tag.
    Decrypt {
        /// Encrypted source file.
        input: PathBuf,

        /// Destination for the decrypted file (must not exist).
        output: PathBuf,

        #[command(flatten)]
        options: CipherOptions,
    },

    /// List supported cipher algorithms.
    Algorithms,
}

#[derive(Args)]
struct CipherOptions {
    /// Password; prompted interactively when omitted.
    #[arg(short, long)]
    password: Option<String>,

    /// PBKDF2 iteration count.
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Cipher algorithm (see `sealstream algorithms`).
    #[arg(short, long)]
    cipher: Option<String>,

    /// MAC hash algorithm.
    #[arg(long)]
    mac_hash: Option<String>,

    /// Key-derivation hash algorithm.
    #[arg(long)]
    kdf_hash: Option<String>,

    /// Store without compression.
    #[arg(long)]
    store: bool,
}

fn read_password(options: &CipherOptions, confirm: bool) -> Result<Zeroizing<String>> {
    if let Some(password) = &options.password {
        return Ok(Zeroizing::new(password.clone()));
    }

    let password = Zeroizing::new(
        rpassword::prompt_password("Password: ").context("Failed to read password")?,
    );
    if confirm {
        let again = Zeroizing::new(
            rpassword::prompt_password("Confirm password: ").context("Failed to read password")?,
        );
        if *password != *again {
            bail!("Passwords do not match");
        }
    }
    Ok(password)
}

fn build_cipher(options: &CipherOptions, confirm: bool) -> Result<FileCipher> {
    let mut cipher = FileCipher::new();

    let password = read_password(options, confirm)?;
    cipher.set_key(password.as_bytes())?;

    if let Some(iterations) = options.iterations {
        cipher.set_iterations(iterations)?;
    }
    if let Some(name) = &options.cipher {
        cipher.set_cipher_algorithm(name)?;
    }
    if let Some(name) = &options.mac_hash {
        cipher.set_mac_hash(name)?;
    }
    if let Some(name) = &options.kdf_hash {
        cipher.set_kdf_hash(name)?;
    }
    cipher.set_compression(!options.store);

    Ok(cipher)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            options,
        } => {
            let mut cipher = build_cipher(&options, true)?;
            cipher
                .encrypt(&input, &output)
                .with_context(|| format!("Failed to encrypt {}", input.display()))?;
            println!("Encrypted {} -> {}", input.display(), output.display());
        }

        Commands::Decrypt {
            input,
            output,
            options,
        } => {
            let mut cipher = build_cipher(&options, false)?;
            let outcome = cipher
                .decrypt(&input, &output)
                .with_context(|| format!("Failed to decrypt {}", input.display()))?;
            match outcome {
                DecryptOutcome::Verified => {
                    println!("Decrypted {} -> {}", input.display(), output.display());
                }
                DecryptOutcome::AuthFailed => {
                    bail!("Verification failed: wrong password or corrupted file");
                }
            }
        }

        Commands::Algorithms => {
            for name in FileCipher::supported_cipher_algorithms() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
