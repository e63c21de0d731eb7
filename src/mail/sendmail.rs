use lettre::{
    Message, SmtpTransport, Transport,
    message::header,
    transport::smtp::authentication::Credentials,
};
use std::env;

/// Send a plain-text email to the store inbox via SMTP.
///
/// `reply_to` carries the customer's address so the store can answer the
/// order or inquiry directly from its mail client.
pub async fn send_email(
    to_email: &str,
    reply_to: &str,
    subject: &str,
    body: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let smtp_username = env::var("SMTP_USERNAME")?;
    let smtp_password = env::var("SMTP_PASSWORD")?;
    let smtp_server = env::var("SMTP_SERVER")?;
    let smtp_port: u16 = env::var("SMTP_PORT")?.parse()?;

    let email = Message::builder()
        .from(smtp_username.parse()?)
        .reply_to(reply_to.parse()?)
        .to(to_email.parse()?)
        .subject(subject)
        .header(header::ContentType::TEXT_PLAIN)
        .body(body)?;

    let creds = Credentials::new(smtp_username.clone(), smtp_password.clone());
    let mailer = SmtpTransport::starttls_relay(&smtp_server)?
        .credentials(creds)
        .port(smtp_port)
        .build();

    mailer.send(&email)?;

    Ok(())
}
