use clap::Parser;
use lightning_dash::{config::Config, converter::CoinGeckoFeed, tui, wallet::Wallet};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal dashboard for a Lightning wallet, with auto-pay on scroll
#[derive(Debug, Parser)]
#[command(name = "lightning-dash", version, about)]
struct Args {
    /// LNbits instance URL (overrides LNBITS_URL)
    #[arg(long)]
    lnbits_url: Option<String>,

    /// Fiat currency for prices (overrides PRICE_FEED_CURRENCY)
    #[arg(long)]
    currency: Option<String>,

    /// Lightning Address or LNURL that auto-pay sends to
    #[arg(long)]
    recipient: Option<String>,

    /// Directory for the daily log file
    #[arg(long)]
    log_dir: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.lnbits_url {
            config.wallet.lnbits_url = url;
        }
        if let Some(currency) = self.currency {
            config.price_feed.currency = currency;
        }
        if let Some(recipient) = self.recipient {
            config.autopay.recipient = recipient;
        }
        if let Some(dir) = self.log_dir {
            config.ui.log_dir = dir;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    args.apply(&mut config);

    // The terminal belongs to the dashboard, so logs go to a file
    let file_appender = tracing_appender::rolling::daily(&config.ui.log_dir, "lightning-dash.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lightning_dash=debug,reqwest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    info!(
        "Configuration loaded: wallet provider {}, price currency {}",
        config.wallet.provider, config.price_feed.currency
    );

    let wallet = Wallet::from_config(&config.wallet);
    let price_feed = Arc::new(CoinGeckoFeed::from_config(&config.price_feed));

    tui::run(config, wallet, price_feed).await
}
