use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use crate::error::BoxError;

/// Plain-text mail sent through SES
struct Mail<'a> {
    to: &'a str,
    subject: &'a str,
    body: String,
}

async fn send(ses: &SesClient, from: &str, mail: Mail<'_>) -> Result<(), BoxError> {
    let subject = Content::builder().data(mail.subject).build()?;
    let body = Body::builder()
        .text(Content::builder().data(mail.body).build()?)
        .build();
    let message = Message::builder().subject(subject).body(body).build();

    ses.send_email()
        .from_email_address(from)
        .destination(Destination::builder().to_addresses(mail.to).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await?;
    Ok(())
}

fn otp_mail<'a>(to: &'a str, code: &str) -> Mail<'a> {
    Mail {
        to,
        subject: "Your verification code",
        body: format!("Your OTP code is: {code}. It expires in 10 minutes."),
    }
}

fn username_mail<'a>(to: &'a str, username: &str) -> Mail<'a> {
    Mail {
        to,
        subject: "Your username",
        body: format!("Your username is: {username}"),
    }
}

/// Registration, resend and password-reset OTP
pub async fn send_otp(ses: &SesClient, from: &str, to: &str, code: &str) -> Result<(), BoxError> {
    send(ses, from, otp_mail(to, code)).await?;
    tracing::info!(to = to, "OTP email sent");
    Ok(())
}

pub async fn send_username(
    ses: &SesClient,
    from: &str,
    to: &str,
    username: &str,
) -> Result<(), BoxError> {
    send(ses, from, username_mail(to, username)).await?;
    tracing::info!(to = to, "Username reminder sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_body_carries_code_and_expiry() {
        let mail = otp_mail("a@example.com", "0042");
        assert_eq!(mail.subject, "Your verification code");
        assert_eq!(mail.body, "Your OTP code is: 0042. It expires in 10 minutes.");
    }

    #[test]
    fn username_body() {
        let mail = username_mail("a@example.com", "alice");
        assert_eq!(mail.body, "Your username is: alice");
        assert_eq!(mail.to, "a@example.com");
    }
}
