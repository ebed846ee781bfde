#[macro_use]
extern crate log;

use std::time::Duration;

use argh::FromArgs;
use smb_probe::{ProbeConfig, SecretValue, SessionOrchestrator, SmbClientTransport, StaticSource};

#[derive(FromArgs)]
#[argh(description = "
Write a probe file to an SMB share and list it.

where positional is the server address (host or ip)")]
struct Args {
    #[argh(option, short = 'P', description = "specify password")]
    password: Option<String>,
    #[argh(option, short = 'u', description = "specify username")]
    username: String,
    #[argh(
        option,
        short = 'w',
        default = r#""WORKGROUP".to_string()"#,
        description = "specify workgroup"
    )]
    workgroup: String,
    #[argh(option, short = 's', description = "specify share")]
    share: String,
    #[argh(option, short = 'p', default = "445", description = "specify port")]
    port: u16,
    #[argh(option, short = 'd', description = "write into this directory of the share")]
    directory: Option<String>,
    #[argh(
        option,
        short = 't',
        default = "10",
        description = "connect and login timeout in seconds"
    )]
    timeout: u64,
    #[argh(option, short = 'r', description = "run identifier (default: process id)")]
    run_id: Option<String>,
    #[argh(positional, description = "server address")]
    server: String,
}

fn main() -> anyhow::Result<()> {
    assert!(env_logger::builder().try_init().is_ok());
    let args: Args = argh::from_env();
    let password = match &args.password {
        Some(p) => p.clone(),
        None => read_secret_from_tty("Password: ")?,
    };
    let secret = serde_json::json!({
        "username": args.username,
        "password": password,
        "host": args.server,
        "share": args.share,
    });
    info!(
        "probing share {} on {}:{} as {} (workgroup {})",
        args.share, args.server, args.port, args.username, args.workgroup
    );

    let timeout = Duration::from_secs(args.timeout);
    let mut config = ProbeConfig::default()
        .domain(&args.workgroup)
        .port(args.port)
        .connect_timeout(timeout)
        .auth_timeout(timeout);
    if let Some(directory) = &args.directory {
        config = config.directory(directory);
    }
    let source = StaticSource::default().secret(
        config.get_secret_id().to_string(),
        SecretValue::Text(secret.to_string()),
    );
    let orchestrator =
        SessionOrchestrator::new(config, source, |_host: &str| SmbClientTransport::new());

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| std::process::id().to_string());
    let report = orchestrator.run(&run_id);
    for entry in report.entries.iter() {
        println!("{}", entry.name);
    }
    println!("{}", report.message());
    if !report.is_success() {
        anyhow::bail!("probe run {} failed", run_id);
    }
    Ok(())
}

/// Read a secret from tty with customisable prompt
fn read_secret_from_tty(prompt: &str) -> std::io::Result<String> {
    rpassword::prompt_password(prompt)
}
