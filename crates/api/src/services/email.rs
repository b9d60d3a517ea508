//! Outbound email: SMTP delivery via lettre with Askama HTML templates.
//!
//! Messages are built by the `*_email` functions and handed to a
//! [`Notifier`] for delivery. [`EmailService`] is the SMTP implementation;
//! [`LoggingNotifier`] stands in when no relay is configured, logging each
//! message (PINs included) so the flows stay usable in development.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use prestige_core::{Email, money::display_usd};

use crate::config::SmtpConfig;

const REGISTRATION_PIN_SUBJECT: &str = "Your Verification PIN";
const RESEND_PIN_SUBJECT: &str = "Your New Verification PIN";
const WELCOME_SUBJECT: &str = "Welcome to Prestige Motor Works!";
const RESET_PIN_SUBJECT: &str = "Your Password Reset PIN";
const PASSWORD_CHANGED_SUBJECT: &str = "Security Alert: Your Password Was Changed";
const ORDER_PIN_SUBJECT: &str = "Confirm Your Prestige Motor Works Purchase";
const ORDER_RECEIPT_SUBJECT: &str = "Your Prestige Motor Works Order Receipt & Thank You!";

/// Failures while rendering or delivering mail.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// The stored address would not parse as an SMTP mailbox.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A ready-to-send message.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: Email,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Delivers the transactional emails the shop produces.
///
/// Sitting behind a trait keeps the confirmation flows testable without an
/// SMTP relay.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError>;
}

// =============================================================================
// Message content
// =============================================================================

/// Everything the order emails need to print a summary.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub items: Vec<OrderSummaryItem>,
    pub cart_total: Decimal,
    pub discount: Option<OrderSummaryDiscount>,
    pub discounted_total: Decimal,
}

/// One configured car as shown in the order emails.
#[derive(Debug, Clone)]
pub struct OrderSummaryItem {
    pub model_name: String,
    pub color: String,
    /// Selected option values joined with ", ", or "None".
    pub modifications: String,
    pub price: Decimal,
}

/// The discount line shown in the order emails.
#[derive(Debug, Clone)]
pub struct OrderSummaryDiscount {
    pub percentage: i16,
    pub description: String,
}

/// A line item formatted for template rendering.
struct OrderItemView {
    model_name: String,
    color: String,
    modifications: String,
    price: String,
}

/// Discount line formatted for template rendering.
struct DiscountView {
    percentage: i16,
    description: String,
}

#[derive(Template)]
#[template(path = "email/registration_pin.html")]
struct RegistrationPinEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/registration_pin.txt")]
struct RegistrationPinEmailText<'a> {
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/resend_pin.html")]
struct ResendPinEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/resend_pin.txt")]
struct ResendPinEmailText<'a> {
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    first_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/reset_pin.html")]
struct ResetPinEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/reset_pin.txt")]
struct ResetPinEmailText<'a> {
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_changed.html")]
struct PasswordChangedEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_changed.txt")]
struct PasswordChangedEmailText<'a> {
    first_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_pin.html")]
struct OrderPinEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
    pin: &'a str,
    items: Vec<OrderItemView>,
    cart_total: String,
    discount: Option<DiscountView>,
    discounted_total: String,
}

#[derive(Template)]
#[template(path = "email/order_pin.txt")]
struct OrderPinEmailText<'a> {
    pin: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_receipt.html")]
struct OrderReceiptEmailHtml<'a> {
    subject: &'a str,
    first_name: &'a str,
    items: Vec<OrderItemView>,
    discount: Option<DiscountView>,
    discounted_total: String,
}

#[derive(Template)]
#[template(path = "email/order_receipt.txt")]
struct OrderReceiptEmailText {
    discounted_total: String,
}

fn item_views(summary: &OrderSummary) -> Vec<OrderItemView> {
    summary
        .items
        .iter()
        .map(|item| OrderItemView {
            model_name: item.model_name.clone(),
            color: item.color.clone(),
            modifications: item.modifications.clone(),
            price: display_usd(item.price),
        })
        .collect()
}

fn discount_view(summary: &OrderSummary) -> Option<DiscountView> {
    summary.discount.as_ref().map(|discount| DiscountView {
        percentage: discount.percentage,
        description: discount.description.clone(),
    })
}

/// Registration PIN for a new sign-up.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn registration_pin_email(
    to: &Email,
    first_name: &str,
    pin: &str,
) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: REGISTRATION_PIN_SUBJECT.to_owned(),
        text: RegistrationPinEmailText { pin }.render()?,
        html: Some(
            RegistrationPinEmailHtml {
                subject: REGISTRATION_PIN_SUBJECT,
                first_name,
                pin,
            }
            .render()?,
        ),
    })
}

/// Replacement registration PIN after a resend request.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn resend_pin_email(
    to: &Email,
    first_name: &str,
    pin: &str,
) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: RESEND_PIN_SUBJECT.to_owned(),
        text: ResendPinEmailText { pin }.render()?,
        html: Some(
            ResendPinEmailHtml {
                subject: RESEND_PIN_SUBJECT,
                first_name,
                pin,
            }
            .render()?,
        ),
    })
}

/// Welcome message after a verified registration.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn welcome_email(to: &Email, first_name: &str) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: WELCOME_SUBJECT.to_owned(),
        text: WelcomeEmailText { first_name }.render()?,
        html: Some(
            WelcomeEmailHtml {
                subject: WELCOME_SUBJECT,
                first_name,
            }
            .render()?,
        ),
    })
}

/// Password reset PIN.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn reset_pin_email(
    to: &Email,
    first_name: &str,
    pin: &str,
) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: RESET_PIN_SUBJECT.to_owned(),
        text: ResetPinEmailText { pin }.render()?,
        html: Some(
            ResetPinEmailHtml {
                subject: RESET_PIN_SUBJECT,
                first_name,
                pin,
            }
            .render()?,
        ),
    })
}

/// Security alert after a password reset completes.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn password_changed_email(to: &Email, first_name: &str) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: PASSWORD_CHANGED_SUBJECT.to_owned(),
        text: PasswordChangedEmailText { first_name }.render()?,
        html: Some(
            PasswordChangedEmailHtml {
                subject: PASSWORD_CHANGED_SUBJECT,
                first_name,
            }
            .render()?,
        ),
    })
}

/// Purchase confirmation PIN with the order summary.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn order_pin_email(
    to: &Email,
    first_name: &str,
    pin: &str,
    summary: &OrderSummary,
) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: ORDER_PIN_SUBJECT.to_owned(),
        text: OrderPinEmailText { pin }.render()?,
        html: Some(
            OrderPinEmailHtml {
                subject: ORDER_PIN_SUBJECT,
                first_name,
                pin,
                items: item_views(summary),
                cart_total: display_usd(summary.cart_total),
                discount: discount_view(summary),
                discounted_total: display_usd(summary.discounted_total),
            }
            .render()?,
        ),
    })
}

/// Receipt for a confirmed order, with the `THANKYOU` follow-up code.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn order_receipt_email(
    to: &Email,
    first_name: &str,
    summary: &OrderSummary,
) -> Result<OutboundEmail, EmailError> {
    Ok(OutboundEmail {
        to: to.clone(),
        subject: ORDER_RECEIPT_SUBJECT.to_owned(),
        text: OrderReceiptEmailText {
            discounted_total: display_usd(summary.discounted_total),
        }
        .render()?,
        html: Some(
            OrderReceiptEmailHtml {
                subject: ORDER_RECEIPT_SUBJECT,
                first_name,
                items: item_views(summary),
                discount: discount_view(summary),
                discounted_total: display_usd(summary.discounted_total),
            }
            .render()?,
        ),
    })
}

// =============================================================================
// SMTP implementation
// =============================================================================

/// Production notifier: hands messages to an SMTP relay over STARTTLS.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Connect the transport described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
        let builder = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.to_string()))?)
            .subject(&email.subject);

        let message = match email.html {
            Some(html) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?,
            None => builder.body(email.text)?,
        };

        self.mailer.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

// =============================================================================
// Dev-mode implementation
// =============================================================================

/// Notifier used when no SMTP relay is configured.
///
/// Logs every message, PIN included, so local sign-up and checkout remain
/// usable without a mail account.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "SMTP disabled; logging email instead of sending"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recipient() -> Email {
        Email::parse("ava@example.com").unwrap()
    }

    fn sample_summary(discount: bool) -> OrderSummary {
        OrderSummary {
            items: vec![OrderSummaryItem {
                model_name: "GT Coupe".to_owned(),
                color: "Racing Green".to_owned(),
                modifications: "Forged alloy wheels, Sport exhaust".to_owned(),
                price: Decimal::from(120_000),
            }],
            cart_total: Decimal::from(120_000),
            discount: discount.then(|| OrderSummaryDiscount {
                percentage: 2,
                description: "Thank you discount".to_owned(),
            }),
            discounted_total: Decimal::from(if discount { 117_600 } else { 120_000 }),
        }
    }

    #[test]
    fn test_order_pin_text_is_just_the_pin_line() {
        let email = order_pin_email(&recipient(), "Ava", "042317", &sample_summary(false)).unwrap();
        assert_eq!(email.subject, "Confirm Your Prestige Motor Works Purchase");
        assert_eq!(email.text.trim(), "Your confirmation PIN is: 042317");
    }

    #[test]
    fn test_order_pin_html_includes_summary_and_discount() {
        let email = order_pin_email(&recipient(), "Ava", "123456", &sample_summary(true)).unwrap();
        let html = email.html.unwrap();

        assert!(html.contains("123456"));
        assert!(html.contains("Car #1:"));
        assert!(html.contains("GT Coupe"));
        assert!(html.contains("Cart Total: $120000"));
        assert!(html.contains("Discount: -2% (Thank you discount)"));
        assert!(html.contains("Total After Discount: $117600"));
        assert!(html.contains("valid for 10 minutes"));
    }

    #[test]
    fn test_order_pin_html_omits_discount_lines_without_discount() {
        let email = order_pin_email(&recipient(), "Ava", "654321", &sample_summary(false)).unwrap();
        let html = email.html.unwrap();

        assert!(html.contains("Cart Total: $120000"));
        assert!(!html.contains("Total After Discount"));
    }

    #[test]
    fn test_receipt_carries_final_total_and_followup_code() {
        let email = order_receipt_email(&recipient(), "Ava", &sample_summary(true)).unwrap();
        let html = email.html.unwrap();

        assert_eq!(
            email.text.trim(),
            "Your order has been confirmed! Total: $117600"
        );
        assert!(html.contains("Total Paid: $117600"));
        assert!(html.contains("Discount applied: -2% (Thank you discount)"));
        assert!(html.contains("THANKYOU (2% off)"));
    }

    #[test]
    fn test_pin_notice_texts() {
        let email = registration_pin_email(&recipient(), "Ava", "111222").unwrap();
        assert_eq!(email.text.trim(), "Your verification PIN is: 111222");

        let email = resend_pin_email(&recipient(), "Ava", "333444").unwrap();
        assert_eq!(email.text.trim(), "Your new verification PIN is: 333444");

        let email = reset_pin_email(&recipient(), "Ava", "555666").unwrap();
        assert_eq!(email.text.trim(), "Your password reset PIN is: 555666");
    }

    #[test]
    fn test_welcome_email_mentions_new_customer_code() {
        let email = welcome_email(&recipient(), "Ava").unwrap();
        let html = email.html.unwrap();

        assert!(html.contains("NEWCUSTOMER"));
        assert!(email.text.contains("NEWCUSTOMER"));
        assert!(html.contains("Dear Ava,"));
    }

    #[test]
    fn test_password_changed_email_addresses_user() {
        let email = password_changed_email(&recipient(), "Ava").unwrap();
        assert_eq!(email.subject, "Security Alert: Your Password Was Changed");
        assert!(email.text.contains("Dear Ava,"));
        assert!(email.text.contains("password reset feature"));
    }
}
