// ABOUTME: Example application sending one SMS, or a long multi-part SMS, through a phone state machine
// ABOUTME: Runs on the in-process dummy phone unless built with the `native` feature

use argh::FromArgs;
use gammu::client::{AsyncStateMachine, StateMachine, StateMachineBuilder};
use gammu::engine::Driver;
use std::error::Error;
use std::time::Duration;

/// Example application to show the simplest case of sending an SMS message
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// gammurc to read instead of the default locations
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// seconds to wait for each confirmation (default: 10)
    #[argh(option)]
    timeout: Option<u64>,

    /// split the message into a concatenated multi-part SMS
    #[argh(switch, short = 'l')]
    long: bool,

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,
}

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging {
            Level::TRACE
        } else {
            Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut builder = StateMachineBuilder::new()
        .timeout(Duration::from_secs(cli_args.timeout.unwrap_or(10)));
    if let Some(config) = &cli_args.config {
        builder = builder.config_path(config);
    }

    #[cfg(feature = "native")]
    let sm = builder.build()?;
    #[cfg(not(feature = "native"))]
    let sm = {
        println!("Built without the `native` feature, using the dummy phone");
        let mut driver = gammu::engine::dummy::DummyDriver::new();
        if let Some(config) = &cli_args.config {
            driver = driver.with_config_file(config);
        }
        builder.build_with(driver)?
    };

    run(sm, cli_args).await
}

async fn run<D>(sm: StateMachine<D>, cli_args: CliArgs) -> Result<(), Box<dyn Error>>
where
    D: Driver + Send + 'static,
    D::Context: Send + 'static,
{
    let phone = AsyncStateMachine::new(sm);

    phone.connect().await.map_err(|e| {
        eprintln!("Connection failed: {e}");
        e
    })?;

    println!("Connected");

    let sent = if cli_args.long {
        phone
            .send_long_sms(cli_args.to, cli_args.message)
            .await
            .map(|references| format!("{references:?}"))
    } else {
        phone
            .send_sms(cli_args.to, cli_args.message)
            .await
            .map(|reference| reference.to_string())
    };

    match sent {
        Ok(ref references) => println!("Message sent successfully! Reference: {references}"),
        Err(ref e) => eprintln!("Failed to send message: {e}"),
    }

    if let Err(e) = phone.disconnect().await {
        eprintln!("Warning: Disconnect failed: {e}");
    }
    phone.free().await?;

    sent?;
    Ok(())
}
