//! Application State
//!
//! Holds every panel's state and turns user actions into wallet calls.
//! Wallet and price-feed calls run in spawned tasks and report back through
//! an event channel that `poll_events` drains on the UI task.

use crate::autopay::{AutoPay, SampleThrottle, TriggerConfig};
use crate::config::Config;
use crate::converter::{Converter, PriceFeed};
use crate::tui::event::AppAction;
use crate::types::{AppError, AppResult, Status};
use crate::wallet::{validate, Invoice, NodeInfo, PaymentReceipt, Wallet};
use futures::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Scroll threshold range offered by the auto-pay settings
pub const THRESHOLD_RANGE: RangeInclusive<f64> = 100.0..=1000.0;
/// Cooldown range offered by the auto-pay settings, seconds
pub const COOLDOWN_RANGE: RangeInclusive<u64> = 1..=30;

/// Dashboard sections, in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Wallet,
    Converter,
    Send,
    Keysend,
    Invoice,
    PayAddress,
    AutoPay,
}

impl Panel {
    pub const ALL: [Panel; 7] = [
        Panel::Wallet,
        Panel::Converter,
        Panel::Send,
        Panel::Keysend,
        Panel::Invoice,
        Panel::PayAddress,
        Panel::AutoPay,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::Wallet => "Wallet Info",
            Panel::Converter => "Fiat/Sats Converter",
            Panel::Send => "Send Payment",
            Panel::Keysend => "Keysend",
            Panel::Invoice => "Invoice Generator",
            Panel::PayAddress => "Pay Address",
            Panel::AutoPay => "Auto Pay on Scroll",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// A single-line text input
#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub placeholder: &'static str,
}

/// A small stack of text inputs with one focused field
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    pub fn new(fields: &[(&'static str, &'static str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|&(label, placeholder)| Field {
                    label,
                    value: String::new(),
                    placeholder,
                })
                .collect(),
            focus: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or_default()
    }

    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
    }

    pub fn push(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }
}

/// Results from spawned wallet and price tasks
#[derive(Debug)]
pub enum AppEvent {
    WalletInfo(AppResult<NodeInfo>),
    Invoice(AppResult<Invoice>),
    Payment {
        panel: Panel,
        description: String,
        result: AppResult<PaymentReceipt>,
    },
    Price(AppResult<f64>),
}

/// Main application state
pub struct App {
    pub config: Config,

    // UI State
    pub panel: Panel,
    pub show_help: bool,
    pub should_quit: bool,
    statuses: HashMap<Panel, Status>,
    busy: HashSet<Panel>,

    // Collaborators
    wallet: Wallet,
    price_feed: Arc<dyn PriceFeed>,

    // Panel State
    pub wallet_info: Option<NodeInfo>,
    pub converter: Converter,
    pub converter_form: Form,
    pub send_form: Form,
    pub keysend_form: Form,
    pub invoice_form: Form,
    pub invoice: Option<Invoice>,
    pub pay_form: Form,

    // Auto-pay State
    pub autopay: AutoPay,
    pub autopay_form: Form,
    pub show_autopay_settings: bool,
    throttle: SampleThrottle,
    pub scroll_offset: u16,
    pub max_scroll: u16,

    // Async communication
    event_rx: mpsc::Receiver<AppEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, wallet: Wallet, price_feed: Arc<dyn PriceFeed>) -> AppResult<Self> {
        let trigger = TriggerConfig::try_from(&config.autopay).map_err(|e| {
            warn!("Invalid auto-pay configuration: {}", e);
            e
        })?;

        let autopay = AutoPay::new(trigger, wallet.clone())
            .with_history_limit(config.autopay.history_limit)
            .with_payment_timeout(config.autopay.payment_timeout());
        let throttle = SampleThrottle::new(config.autopay.throttle());

        let (event_tx, event_rx) = mpsc::channel(100);

        let mut app = Self {
            config,
            panel: Panel::Wallet,
            show_help: false,
            should_quit: false,
            statuses: HashMap::new(),
            busy: HashSet::new(),
            wallet,
            price_feed,
            wallet_info: None,
            converter: Converter::new(),
            converter_form: Form::new(&[("USD", "0.00"), ("Satoshis", "0")]),
            send_form: Form::new(&[("Payment Request", "lnbc... or lightning:lnbc...")]),
            keysend_form: Form::new(&[("Node Public Key", "02abc..."), ("Amount (sats)", "1000")]),
            invoice_form: Form::new(&[("Amount (sats)", "1000"), ("Memo / Description", "What's this invoice for?")]),
            invoice: None,
            pay_form: Form::new(&[("Lightning Address or LNURL", "name@example.com"), ("Amount (sats)", "100")]),
            autopay,
            autopay_form: Form::new(&[
                ("Lightning Address", "satoshi@getalby.com"),
                ("Sats per Scroll", "1"),
                ("Scroll Threshold", "100-1000"),
                ("Cooldown Period (s)", "1-30"),
            ]),
            show_autopay_settings: false,
            throttle,
            scroll_offset: 0,
            max_scroll: 0,
            event_rx,
            event_tx,
        };
        app.fill_autopay_form();
        Ok(app)
    }

    /// Initial fetches, run once the runtime is up
    pub fn start(&mut self) {
        self.fetch_wallet_info();
        self.fetch_price();
    }

    pub fn status(&self, panel: Panel) -> Option<&Status> {
        match panel {
            Panel::AutoPay => self.autopay.status(),
            _ => self.statuses.get(&panel),
        }
    }

    pub fn is_busy(&self, panel: Panel) -> bool {
        match panel {
            Panel::AutoPay => self.autopay.is_processing(),
            _ => self.busy.contains(&panel),
        }
    }

    pub fn wallet_available(&self) -> bool {
        self.wallet.is_available()
    }

    /// The form that receives typed characters on the current panel
    pub fn active_form(&self) -> Option<&Form> {
        match self.panel {
            Panel::Wallet => None,
            Panel::Converter => Some(&self.converter_form),
            Panel::Send => Some(&self.send_form),
            Panel::Keysend => Some(&self.keysend_form),
            Panel::Invoice => Some(&self.invoice_form),
            Panel::PayAddress => Some(&self.pay_form),
            Panel::AutoPay => self.show_autopay_settings.then_some(&self.autopay_form),
        }
    }

    fn active_form_mut(&mut self) -> Option<&mut Form> {
        match self.panel {
            Panel::Wallet => None,
            Panel::Converter => Some(&mut self.converter_form),
            Panel::Send => Some(&mut self.send_form),
            Panel::Keysend => Some(&mut self.keysend_form),
            Panel::Invoice => Some(&mut self.invoice_form),
            Panel::PayAddress => Some(&mut self.pay_form),
            Panel::AutoPay => {
                if self.show_autopay_settings {
                    Some(&mut self.autopay_form)
                } else {
                    None
                }
            }
        }
    }

    fn set_status(&mut self, panel: Panel, status: Status) {
        self.statuses.insert(panel, status);
    }

    /// Drain finished background work
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
        self.autopay.poll_completions();
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::WalletInfo(result) => {
                self.busy.remove(&Panel::Wallet);
                match result {
                    Ok(info) => {
                        self.wallet_info = Some(info);
                        self.statuses.remove(&Panel::Wallet);
                    }
                    Err(e) => self.set_status(Panel::Wallet, Status::from(&e)),
                }
            }
            AppEvent::Invoice(result) => {
                self.busy.remove(&Panel::Invoice);
                match result {
                    Ok(invoice) => {
                        self.set_status(Panel::Invoice, Status::success("Invoice created"));
                        self.invoice = Some(invoice);
                    }
                    Err(e) => self.set_status(Panel::Invoice, Status::from(&e)),
                }
            }
            AppEvent::Payment { panel, description, result } => {
                self.busy.remove(&panel);
                match result {
                    Ok(receipt) => {
                        let message = match receipt.payment_hash {
                            Some(hash) => format!("{} (hash {})", description, validate::truncate_invoice(&hash)),
                            None => description,
                        };
                        self.set_status(panel, Status::success(message));
                        self.fetch_wallet_info();
                    }
                    Err(e) => self.set_status(panel, Status::from(&e)),
                }
            }
            AppEvent::Price(result) => {
                self.busy.remove(&Panel::Converter);
                match self.converter.apply(result) {
                    Ok(_) => {
                        self.statuses.remove(&Panel::Converter);
                        self.recompute_conversion(0);
                    }
                    Err(_) => self.set_status(Panel::Converter, Status::error("Failed to fetch BTC price.")),
                }
            }
        }
    }

    /// Handle a user action
    pub fn handle_action(&mut self, action: AppAction) {
        if self.show_help {
            if matches!(action, AppAction::Quit) {
                self.should_quit = true;
            } else if !matches!(action, AppAction::Tick) {
                self.show_help = false;
            }
            return;
        }

        match action {
            AppAction::Quit => self.should_quit = true,
            AppAction::ToggleHelp => self.show_help = true,
            AppAction::NextPanel => self.panel = self.panel.next(),
            AppAction::PrevPanel => self.panel = self.panel.prev(),
            AppAction::Escape => {
                if self.panel == Panel::AutoPay {
                    if self.show_autopay_settings {
                        self.show_autopay_settings = false;
                    } else {
                        self.autopay.clear_status();
                    }
                } else {
                    self.statuses.remove(&self.panel);
                }
            }
            AppAction::Submit => self.submit(),
            AppAction::Refresh => match self.panel {
                Panel::Converter => self.fetch_price(),
                _ => self.fetch_wallet_info(),
            },
            AppAction::ToggleAutoPay => {
                let position = self.scroll_position();
                self.autopay.toggle(position);
            }
            AppAction::ToggleAutoPaySettings => {
                if self.panel == Panel::AutoPay {
                    self.show_autopay_settings = !self.show_autopay_settings;
                    if self.show_autopay_settings {
                        self.fill_autopay_form();
                    }
                }
            }
            AppAction::ScrollUp => self.move_up(1),
            AppAction::ScrollDown => self.move_down(1),
            AppAction::ScrollPageUp => self.scroll_by(-10),
            AppAction::ScrollPageDown => self.scroll_by(10),
            AppAction::DeleteKey => {
                if let Some(form) = self.active_form_mut() {
                    form.pop();
                }
                self.after_edit();
            }
            AppAction::Input(c) => {
                if let Some(form) = self.active_form_mut() {
                    form.push(c);
                }
                self.after_edit();
            }
            AppAction::Tick => {}
        }
    }

    fn move_up(&mut self, rows: i32) {
        match self.active_form_mut() {
            Some(form) => form.focus_prev(),
            None => self.scroll_by(-rows),
        }
    }

    fn move_down(&mut self, rows: i32) {
        match self.active_form_mut() {
            Some(form) => form.focus_next(),
            None => self.scroll_by(rows),
        }
    }

    /// Scroll the auto-pay testing area and feed the trigger
    fn scroll_by(&mut self, rows: i32) {
        if self.panel != Panel::AutoPay {
            return;
        }
        let target = (self.scroll_offset as i32 + rows).clamp(0, self.max_scroll as i32) as u16;
        if target == self.scroll_offset {
            return;
        }
        self.scroll_offset = target;

        if self.throttle.admit() {
            let position = self.scroll_position();
            self.autopay.on_sample(position, Instant::now());
        }
    }

    /// Scroll offset in pixel-equivalent units
    pub fn scroll_position(&self) -> f64 {
        self.scroll_offset as f64 * self.config.ui.row_height_px as f64
    }

    /// Update max scroll based on content
    pub fn update_scroll_bounds(&mut self, content_height: u16, viewport_height: u16) {
        self.max_scroll = content_height.saturating_sub(viewport_height);
        if self.scroll_offset > self.max_scroll {
            self.scroll_offset = self.max_scroll;
        }
    }

    /// Keep the converter's other field in sync with the one being typed in
    fn after_edit(&mut self) {
        if self.panel == Panel::Converter {
            let focus = self.converter_form.focus;
            self.recompute_conversion(focus);
        }
    }

    fn recompute_conversion(&mut self, source: usize) {
        let input = self.converter_form.value(source).to_string();
        let result = if source == 0 {
            self.converter
                .fiat_to_sats(&input)
                .map(|sats| sats.map(|s| s.to_string()).unwrap_or_default())
        } else {
            self.converter.sats_to_fiat(&input).map(Option::unwrap_or_default)
        };

        match result {
            Ok(converted) => {
                self.converter_form.set(1 - source, converted);
                self.statuses.remove(&Panel::Converter);
            }
            Err(e) => {
                self.converter_form.set(1 - source, "");
                self.set_status(Panel::Converter, Status::from(&e));
            }
        }
    }

    fn submit(&mut self) {
        match self.panel {
            Panel::Wallet => self.fetch_wallet_info(),
            Panel::Converter => self.fetch_price(),
            Panel::Send => self.submit_send(),
            Panel::Keysend => self.submit_keysend(),
            Panel::Invoice => self.submit_invoice(),
            Panel::PayAddress => self.submit_pay_address(),
            Panel::AutoPay => {
                if self.show_autopay_settings {
                    self.save_autopay_settings();
                }
            }
        }
    }

    fn fetch_wallet_info(&mut self) {
        if !self.busy.insert(Panel::Wallet) {
            return;
        }
        let wallet = self.wallet.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = wallet.get_info().await;
            tx.send(AppEvent::WalletInfo(result)).await.ok();
        });
    }

    fn fetch_price(&mut self) {
        if !self.busy.insert(Panel::Converter) {
            return;
        }
        let feed = self.price_feed.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = feed.fetch_rate().await;
            tx.send(AppEvent::Price(result)).await.ok();
        });
    }

    fn submit_invoice(&mut self) {
        if !self.busy.insert(Panel::Invoice) {
            return;
        }
        self.invoice = None;
        self.set_status(Panel::Invoice, Status::info("Generating..."));

        let amount = self.invoice_form.value(0).to_string();
        let memo = self.invoice_form.value(1).to_string();
        let wallet = self.wallet.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = wallet.make_invoice(&amount, &memo).await;
            tx.send(AppEvent::Invoice(result)).await.ok();
        });
    }

    fn submit_send(&mut self) {
        let request = self.send_form.value(0).to_string();
        self.spawn_payment(Panel::Send, "Payment sent".to_string(), move |wallet| {
            async move { wallet.send_payment(&request).await }.boxed()
        });
    }

    fn submit_keysend(&mut self) {
        let destination = self.keysend_form.value(0).to_string();
        let amount = self.keysend_form.value(1).to_string();
        let description = format!("Keysend of {} sats sent", amount.trim());
        self.spawn_payment(Panel::Keysend, description, move |wallet| {
            async move { wallet.keysend(&destination, &amount).await }.boxed()
        });
    }

    fn submit_pay_address(&mut self) {
        let identifier = self.pay_form.value(0).to_string();
        let amount_sats = match validate::parse_sats(self.pay_form.value(1)) {
            Ok(sats) => sats,
            Err(e) => return self.set_status(Panel::PayAddress, Status::from(&e)),
        };
        let description = format!("Payment of {} sats sent to {}", amount_sats, identifier.trim());
        self.spawn_payment(Panel::PayAddress, description, move |wallet| {
            async move { wallet.pay_to_identifier(&identifier, amount_sats).await }.boxed()
        });
    }

    fn spawn_payment<F>(&mut self, panel: Panel, description: String, pay: F)
    where
        F: FnOnce(Wallet) -> BoxFuture<'static, AppResult<PaymentReceipt>> + Send + 'static,
    {
        if !self.busy.insert(panel) {
            return;
        }
        self.set_status(panel, Status::info("Sending..."));
        debug!("Starting payment from {:?} panel", panel);

        let wallet = self.wallet.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(pay(wallet))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(AppError::from_panic(panic)));
            tx.send(AppEvent::Payment { panel, description, result }).await.ok();
        });
    }

    fn fill_autopay_form(&mut self) {
        let config = self.autopay.config().clone();
        self.autopay_form.set(0, config.recipient);
        self.autopay_form.set(1, config.amount_sats.to_string());
        self.autopay_form.set(2, config.distance_threshold.to_string());
        self.autopay_form.set(3, config.cooldown.as_secs().to_string());
    }

    fn parse_autopay_form(&self) -> AppResult<TriggerConfig> {
        let recipient = self.autopay_form.value(0).trim().to_string();
        if recipient.is_empty() {
            return Err(AppError::InvalidInput("Lightning Address is required".to_string()));
        }
        let amount_sats = validate::parse_sats(self.autopay_form.value(1))?;

        let threshold: f64 = self
            .autopay_form
            .value(2)
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidInput("scroll threshold must be a number".to_string()))?;
        if !THRESHOLD_RANGE.contains(&threshold) {
            return Err(AppError::InvalidInput(format!(
                "scroll threshold must be between {} and {}",
                THRESHOLD_RANGE.start(),
                THRESHOLD_RANGE.end()
            )));
        }

        let cooldown: u64 = self
            .autopay_form
            .value(3)
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidInput("cooldown must be whole seconds".to_string()))?;
        if !COOLDOWN_RANGE.contains(&cooldown) {
            return Err(AppError::InvalidInput(format!(
                "cooldown must be between {} and {} seconds",
                COOLDOWN_RANGE.start(),
                COOLDOWN_RANGE.end()
            )));
        }

        TriggerConfig::new(amount_sats, recipient, threshold, Duration::from_secs(cooldown))
    }

    fn save_autopay_settings(&mut self) {
        match self.parse_autopay_form().and_then(|config| self.autopay.update_config(config)) {
            Ok(()) => {
                self.show_autopay_settings = false;
                self.statuses.remove(&Panel::AutoPay);
            }
            Err(e) => self.set_status(Panel::AutoPay, Status::from(&e)),
        }
    }

    /// Validation message for the auto-pay settings form, if any
    pub fn settings_status(&self) -> Option<&Status> {
        self.statuses.get(&Panel::AutoPay)
    }
}
