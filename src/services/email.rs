use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use log::{debug, error, info, warn};
use rocket::fairing::AdHoc;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::AppConfig;
use crate::models::{hiring::format_date, Employer, Hiring, Housekeeper};

/// Everything the operator email needs about a freshly created hiring.
#[derive(Debug, Clone)]
pub struct HiringNotice {
    pub employer: Employer,
    pub housekeeper: Housekeeper,
    pub hiring: Hiring,
}

/// Handle to the notification queue. Enqueueing never blocks and never fails
/// the caller: a full or closed queue drops the notice with a warning.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<HiringNotice>,
}

impl Notifier {
    pub fn channel(capacity: usize) -> (Notifier, mpsc::Receiver<HiringNotice>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Notifier { tx }, rx)
    }

    pub fn notify_hiring_created(&self, notice: HiringNotice) {
        match self.tx.try_send(notice) {
            Ok(()) => debug!("Hiring notification queued"),
            Err(TrySendError::Full(notice)) => warn!(
                "Notification queue full; dropping notice for hiring {:?}",
                notice.hiring.id
            ),
            Err(TrySendError::Closed(notice)) => warn!(
                "Notification worker stopped; dropping notice for hiring {:?}",
                notice.hiring.id
            ),
        }
    }
}

pub fn compose_hiring_message(notice: &HiringNotice) -> String {
    let HiringNotice {
        employer,
        housekeeper,
        hiring,
    } = notice;

    format!(
        "Employer Details:\n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         Address: {}\n\
         Family Size: {}\n\
         \n\
         Housekeeper Details:\n\
         Name: {}\n\
         Category: {}\n\
         Employment Type: {}\n\
         Experience: {} years\n\
         \n\
         Hiring Details:\n\
         Salary offered: ${:.2}\n\
         Start Date: {}\n\
         Delivery Type: {}\n\
         Requirements: {}\n",
        employer.name,
        employer.email,
        employer.phone_number,
        employer.address,
        employer
            .family_size
            .map(|size| size.to_string())
            .unwrap_or_else(|| "-".to_string()),
        housekeeper.name,
        housekeeper.category,
        housekeeper.employment_type,
        housekeeper.experience,
        hiring.salary_offer,
        format_date(hiring.start_date),
        hiring.delivery_type,
        hiring.requirements,
    )
}

/// Authenticated relay connection plus the fixed operator recipient.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl Mailer {
    /// `Ok(None)` when relay credentials or the recipient are missing.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, Box<dyn std::error::Error + Send + Sync>> {
        if !config.is_mail_configured() {
            return Ok(None);
        }

        let from: Mailbox = config.mail_from().parse()?;
        let to: Mailbox = config.admin_email.as_deref().unwrap_or_default().parse()?;
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };
        let transport = builder.port(config.smtp_port).credentials(creds).build();

        Ok(Some(Mailer { transport, from, to }))
    }

    pub async fn send(&self, notice: &HiringNotice) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject("New Hiring Request")
            .header(ContentType::TEXT_PLAIN)
            .body(compose_hiring_message(notice))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Drains the queue until every `Notifier` is dropped. Failures are logged
/// and never reach the request that queued the notice.
pub async fn run_worker(mut rx: mpsc::Receiver<HiringNotice>, mailer: Option<Mailer>) {
    while let Some(notice) = rx.recv().await {
        let Some(mailer) = mailer.as_ref() else {
            warn!(
                "Email not configured; skipping notification for hiring {:?}",
                notice.hiring.id
            );
            continue;
        };

        match mailer.send(&notice).await {
            Ok(()) => info!("Hiring notification sent for {:?}", notice.hiring.id),
            Err(e) => error!("Failed to send hiring notification: {}", e),
        }
    }
    debug!("Notification worker stopped");
}

pub fn init() -> AdHoc {
    AdHoc::on_ignite("Notifier", |rocket| async move {
        let config = rocket.state::<AppConfig>().cloned().unwrap_or_default();

        let mailer = match Mailer::from_config(&config) {
            Ok(Some(mailer)) => Some(mailer),
            Ok(None) => {
                warn!("SMTP credentials or ADMIN_EMAIL missing; hiring notifications disabled");
                None
            }
            Err(e) => {
                error!("Invalid mail settings, hiring notifications disabled: {}", e);
                None
            }
        };

        let (notifier, rx) = Notifier::channel(config.notify_queue_capacity);
        tokio::spawn(run_worker(rx, mailer));
        rocket.manage(notifier)
    })
}
