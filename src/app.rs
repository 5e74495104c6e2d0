use crate::api::types::{ContactInfo, ContactMessage};
use crate::api::TravelApi;
use crate::commands;
use crate::config::Config;
use crate::session::{
  Navigator, RouteInfo, Router, SessionStore, ADMIN_LOGIN_ROUTE, ADMIN_TOKEN_KEY, ADMIN_USER_KEY,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

const CONTACT_ROUTE: &str = "/contact";
const EMAIL_SETTINGS_ROUTE: &str = "/admin/email-settings";
const CACHE_ROUTE: &str = "/admin/cache";
const ADMIN_HOME_ROUTE: &str = "/admin";

const SENT_FEEDBACK: &str = "Message sent successfully!";
const FAILED_FEEDBACK: &str = "Something went wrong!";
const NO_TOKEN_FEEDBACK: &str = "No authentication token found. Please login again.";

/// Everything the client can do, from the command line or the shell
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
  /// Agency contact page
  Contact {
    #[command(subcommand)]
    action: ContactAction,
  },
  /// Admin email notification settings
  Email {
    #[command(subcommand)]
    action: EmailAction,
  },
  /// Response cache diagnostics
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
  /// Admin session token
  Session {
    #[command(subcommand)]
    action: SessionAction,
  },
  /// Show how a location is split into path, query and fragment
  RouteTest {
    /// Location such as /admin/reset?token=abc#form
    location: String,
  },
  /// Interactive shell; the cache and overlay persist between commands
  Shell,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ContactAction {
  /// Show contact details
  Show,
  /// Send a message through the contact form
  Send {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    message: String,
  },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailAction {
  /// Whether notification emails are enabled
  Status,
  /// Flip notification emails on or off
  Toggle,
  /// Send a test email
  Test,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
  /// Number of entries and their keys
  Stats,
  /// Drop entries containing PATTERN, or everything
  Clear { pattern: Option<String> },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
  /// Store an admin bearer token
  Login {
    #[arg(long)]
    token: String,
    /// Admin user name to remember alongside the token
    #[arg(long)]
    user: Option<String>,
  },
  /// Forget the admin token
  Logout,
}

/// One line typed into the shell
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
  #[command(subcommand)]
  action: Action,
}

/// Main application state
pub struct App {
  config: Config,
  api: TravelApi,
  session: Arc<dyn SessionStore>,
  router: Arc<Router>,
}

impl App {
  pub fn new(
    config: Config,
    api: TravelApi,
    session: Arc<dyn SessionStore>,
    router: Arc<Router>,
  ) -> Self {
    Self {
      config,
      api,
      session,
      router,
    }
  }

  /// Run one action and return what should be printed.
  pub async fn execute(&self, action: Action) -> Result<String> {
    match action {
      Action::Contact { action } => self.contact(action).await,
      Action::Email { action } => self.email(action).await,
      Action::Cache { action } => Ok(self.cache(action)),
      Action::Session { action } => self.session(action),
      Action::RouteTest { location } => self.route_test(&location),
      Action::Shell => Err(eyre!("Already in the shell")),
    }
  }

  async fn contact(&self, action: ContactAction) -> Result<String> {
    self.router.navigate(CONTACT_ROUTE);

    match action {
      ContactAction::Show => {
        let info = self
          .api
          .contact_info()
          .await
          .wrap_err("Failed to load contact information. Please try again later.")?;
        Ok(render_contact(&info))
      }
      ContactAction::Send {
        name,
        email,
        phone,
        message,
      } => {
        let message = ContactMessage {
          name,
          email,
          phone,
          message,
        };
        match self.api.send_contact_message(&message).await {
          Ok(()) => Ok(SENT_FEEDBACK.to_string()),
          Err(e) => {
            warn!(error = %e, "contact message not sent");
            Err(eyre!(e).wrap_err(FAILED_FEEDBACK))
          }
        }
      }
    }
  }

  async fn email(&self, action: EmailAction) -> Result<String> {
    self.router.navigate(EMAIL_SETTINGS_ROUTE);

    let result = match action {
      EmailAction::Status => self.api.email_status().await.map(|status| {
        format!(
          "Email notifications are {}",
          if status.email_enabled { "enabled" } else { "disabled" }
        )
      }),
      EmailAction::Toggle => {
        self.require_token()?;
        match self.api.email_status().await {
          Ok(status) => self
            .api
            .set_email_enabled(!status.email_enabled)
            .await
            .map(|r| r.message),
          Err(e) => Err(e),
        }
      }
      EmailAction::Test => {
        self.require_token()?;
        self.api.test_email().await.map(|r| r.message)
      }
    };

    result.map_err(|e| {
      let report = eyre!(e);
      if self.router.location() == ADMIN_LOGIN_ROUTE {
        report.wrap_err("Admin session ended; log in again with `session login --token <TOKEN>`")
      } else {
        report
      }
    })
  }

  fn require_token(&self) -> Result<()> {
    let token = self.session.get(ADMIN_TOKEN_KEY)?;
    if token.map_or(true, |t| t.is_empty()) {
      return Err(eyre!(NO_TOKEN_FEEDBACK));
    }
    Ok(())
  }

  fn cache(&self, action: CacheAction) -> String {
    self.router.navigate(CACHE_ROUTE);

    match action {
      CacheAction::Stats => {
        let stats = self.api.cache_stats();
        let mut out = format!("{} cached response(s)", stats.size);
        for key in &stats.keys {
          let _ = write!(out, "\n  {}", key);
        }
        out
      }
      CacheAction::Clear { pattern } => {
        self.api.clear_cache(pattern.as_deref());
        match pattern {
          Some(p) => format!("Cleared cached responses matching '{}'", p),
          None => "Cleared all cached responses".to_string(),
        }
      }
    }
  }

  fn session(&self, action: SessionAction) -> Result<String> {
    match action {
      SessionAction::Login { token, user } => {
        if token.trim().is_empty() {
          return Err(eyre!("Token must not be empty"));
        }
        self.session.set(ADMIN_TOKEN_KEY, token.trim())?;
        match &user {
          Some(user) => {
            let profile = serde_json::json!({ "username": user }).to_string();
            self.session.set(ADMIN_USER_KEY, &profile)?;
          }
          None => self.session.remove(ADMIN_USER_KEY)?,
        }
        self.router.navigate(ADMIN_HOME_ROUTE);
        info!(user = ?user, "admin token stored");
        Ok("Admin token stored".to_string())
      }
      SessionAction::Logout => {
        self.session.remove(ADMIN_TOKEN_KEY)?;
        self.session.remove(ADMIN_USER_KEY)?;
        self.router.navigate(ADMIN_LOGIN_ROUTE);
        info!("admin token removed");
        Ok("Logged out".to_string())
      }
    }
  }

  fn route_test(&self, location: &str) -> Result<String> {
    let route = RouteInfo::parse(location)?;
    self.router.navigate(location);

    Ok(format!(
      "Current Path: {}\nToken: {}\nSearch Params: {}\nHash: {}",
      route.path,
      route.token.as_deref().unwrap_or("No token provided"),
      route.search,
      route.hash
    ))
  }

  /// Read commands from stdin until `quit` or end of input.
  pub async fn run_shell(&self) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let title = self
      .config
      .title
      .clone()
      .unwrap_or_else(|| self.config.api.url.clone());
    stdout
      .write_all(format!("{} (type `help` for commands)\n", title).as_bytes())
      .await?;

    loop {
      stdout.write_all(b"> ").await?;
      stdout.flush().await?;

      let Some(line) = lines.next_line().await? else {
        break;
      };

      match self.shell_line(&line).await {
        ShellOutcome::Quit => break,
        ShellOutcome::Output(text) if text.is_empty() => {}
        ShellOutcome::Output(text) => stdout.write_all(format!("{}\n", text).as_bytes()).await?,
      }
    }

    Ok(())
  }

  async fn shell_line(&self, line: &str) -> ShellOutcome {
    let mut words = match commands::split_line(line) {
      Ok(words) => words,
      Err(e) => return ShellOutcome::Output(e),
    };
    let Some(first) = words.first() else {
      return ShellOutcome::Output(String::new());
    };

    let Some(command) = commands::resolve(first) else {
      let suggestions: Vec<&str> = commands::get_suggestions(first)
        .iter()
        .map(|c| c.name)
        .collect();
      return ShellOutcome::Output(if suggestions.is_empty() {
        format!("Unknown command '{}'", first)
      } else {
        format!("Unknown command '{}'. Did you mean: {}?", first, suggestions.join(", "))
      });
    };

    match command.name {
      "quit" => return ShellOutcome::Quit,
      "help" => return ShellOutcome::Output(help_text()),
      name => words[0] = name.to_string(),
    }

    let parsed = match ShellLine::try_parse_from(&words) {
      Ok(parsed) => parsed,
      Err(e) => return ShellOutcome::Output(e.to_string().trim_end().to_string()),
    };

    match self.execute(parsed.action).await {
      Ok(text) => ShellOutcome::Output(text),
      Err(e) => ShellOutcome::Output(format!("{:#}", e)),
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
enum ShellOutcome {
  Output(String),
  Quit,
}

fn help_text() -> String {
  commands::COMMANDS
    .iter()
    .map(|cmd| format!("{:<12}{}", cmd.name, cmd.description))
    .collect::<Vec<_>>()
    .join("\n")
}

fn render_contact(info: &ContactInfo) -> String {
  let whatsapp = info.whatsapp_link();
  let address = info.address();
  let rows = [
    ("Office", info.phone_office.as_deref()),
    ("Mobile", info.phone_mobile.as_deref()),
    ("WhatsApp", whatsapp.as_deref()),
    ("Email", info.email_primary.as_deref()),
    ("Bookings", info.email_bookings.as_deref()),
    ("Support", info.email_support.as_deref()),
    ("Mon-Sat", info.business_hours_weekdays.as_deref()),
    ("Sunday", info.business_hours_sunday.as_deref()),
    ("Address", address.as_deref()),
    ("Facebook", info.social_facebook.as_deref()),
    ("Instagram", info.social_instagram.as_deref()),
    ("LinkedIn", info.social_linkedin.as_deref()),
  ];

  let lines: Vec<String> = rows
    .iter()
    .filter_map(|(label, value)| value.map(|v| format!("{:<10}{}", label, v)))
    .collect();

  if lines.is_empty() {
    "No contact details published yet".to_string()
  } else {
    lines.join("\n")
  }
}
