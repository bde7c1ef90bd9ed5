//! HTML bodies for outgoing mail, built with `maud` so every interpolated
//! user value is escaped.

use maud::{html, Markup};

use super::OutgoingEmail;

const BRAND_GREEN: &str = "#00c950";
const WRAPPER: &str = "font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;";

/// A contact form submission.
#[derive(Debug, Clone, Copy)]
pub struct ContactSubmission<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub message: &'a str,
}

/// A customer asking a finance partner to get in touch.
#[derive(Debug, Clone, Copy)]
pub struct FinanceInquiry<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub city: Option<&'a str>,
    pub region: Option<&'a str>,
    pub partner_name: &'a str,
}

impl FinanceInquiry<'_> {
    fn customer_details(&self) -> Markup {
        let optional = [("Phone", self.phone), ("City", self.city), ("Region", self.region)];
        html! {
            div style="background-color: #f5f5f5; padding: 20px; border-radius: 5px; margin: 20px 0;" {
                h3 style="color: #333; margin-top: 0;" { "Customer Details" }
                p { strong { "Name:" } " " (self.name) }
                p { strong { "Email:" } " " (self.email) }
                @for (label, value) in optional {
                    @if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                        p { strong { (label) ":" } " " (value) }
                    }
                }
            }
        }
    }
}

fn brand_link(href: String, text: &str) -> Markup {
    html! {
        a href=(href) style=(format!("color: {BRAND_GREEN}; text-decoration: none;")) { (text) }
    }
}

/// Contact form submission to the customer service inbox, reply-to the sender.
pub fn contact_submission(inbox: &str, submission: &ContactSubmission<'_>) -> OutgoingEmail {
    let label = "padding: 10px 0; color: #666; font-weight: bold;";
    let cell = "padding: 10px 0;";
    let markup = html! {
        div style=(WRAPPER) {
            div style=(format!("background: {BRAND_GREEN}; padding: 20px; border-radius: 10px 10px 0 0;")) {
                h2 style="color: #ffffff; margin: 0;" { "New Contact Form Submission" }
            }
            div style="background: #f5f5f5; padding: 30px; border-radius: 0 0 10px 10px;" {
                div style="background: white; padding: 20px; border-radius: 8px; margin-bottom: 15px;" {
                    h3 style="color: #1a1a1a; margin-top: 0;" { "Contact Details" }
                    table style="width: 100%; border-collapse: collapse;" {
                        tr {
                            td style=(format!("{label} width: 100px;")) { "Name:" }
                            td style=(cell) { (submission.name) }
                        }
                        tr {
                            td style=(label) { "Phone:" }
                            td style=(cell) { (brand_link(format!("tel:{}", submission.phone), submission.phone)) }
                        }
                        tr {
                            td style=(label) { "Email:" }
                            td style=(cell) { (brand_link(format!("mailto:{}", submission.email), submission.email)) }
                        }
                    }
                }
                div style="background: white; padding: 20px; border-radius: 8px;" {
                    h3 style="color: #1a1a1a; margin-top: 0;" { "Message" }
                    p style="color: #333; line-height: 1.6; white-space: pre-wrap;" { (submission.message) }
                }
            }
            div style="text-align: center; padding: 20px; color: #999; font-size: 12px;" {
                p { "This email was sent from the SOMOCO EV contact form" }
            }
        }
    };

    OutgoingEmail {
        to: inbox.to_string(),
        reply_to: Some(submission.email.to_string()),
        subject: format!("New Contact Form Submission from {}", submission.name),
        html: markup.into_string(),
    }
}

/// Inquiry delivered to the finance partner.
pub fn partner_inquiry(partner_email: &str, inquiry: &FinanceInquiry<'_>) -> OutgoingEmail {
    let markup = html! {
        div style=(WRAPPER) {
            h2 style=(format!("color: {BRAND_GREEN};")) { "New Asset Finance Inquiry" }
            p style="color: #666;" { "This inquiry was submitted through the Somoco EV website." }
            (inquiry.customer_details())
            p style="color: #666; font-size: 14px;" {
                "Please reach out to this customer at your earliest convenience."
            }
            hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;";
            p style="color: #999; font-size: 12px;" {
                "This email was sent via Somoco EV's asset finance partner program."
            }
        }
    };

    OutgoingEmail {
        to: partner_email.to_string(),
        reply_to: Some(inquiry.email.to_string()),
        subject: format!("New Finance Inquiry from {} via Somoco EV", inquiry.name),
        html: markup.into_string(),
    }
}

/// Tracking copy of a partner inquiry for the Somoco inbox.
pub fn partner_copy(inbox: &str, partner_email: &str, inquiry: &FinanceInquiry<'_>) -> OutgoingEmail {
    let markup = html! {
        div style=(WRAPPER) {
            h2 style=(format!("color: {BRAND_GREEN};")) { "Finance Inquiry Copy" }
            p style="color: #666;" {
                "A customer has submitted an inquiry to " strong { (inquiry.partner_name) } "."
            }
            (inquiry.customer_details())
            div style="background-color: #e8f5e9; padding: 15px; border-radius: 5px;" {
                p style="margin: 0;" { strong { "Partner:" } " " (inquiry.partner_name) }
                p style="margin: 5px 0 0 0;" { strong { "Partner Email:" } " " (partner_email) }
            }
        }
    };

    OutgoingEmail {
        to: inbox.to_string(),
        reply_to: None,
        subject: format!(
            "[Copy] Finance Inquiry to {} from {}",
            inquiry.partner_name, inquiry.name
        ),
        html: markup.into_string(),
    }
}

/// New admin credentials. The plaintext appears only in this message.
pub fn password_reset(to: &str, username: &str, password: &str) -> OutgoingEmail {
    let markup = html! {
        div style=(WRAPPER) {
            h2 style="color: #1a1a1a;" { "Password Reset Successful" }
            p { "Your admin password has been reset. Here are your new credentials:" }
            div style="background: #f5f5f5; padding: 15px; border-radius: 5px; margin: 20px 0;" {
                p style="margin: 5px 0;" { strong { "Username:" } " " (username) }
                p style="margin: 5px 0;" {
                    strong { "New Password:" } " "
                    code style="background: #fff; padding: 5px 10px; border-radius: 3px;" { (password) }
                }
            }
            p style="color: #666; font-size: 14px;" {
                "Please log in with this password and consider changing it to something memorable."
            }
            p style="color: #999; font-size: 12px; margin-top: 30px;" {
                "If you didn't request this password reset, please contact your system administrator immediately."
            }
        }
    };

    OutgoingEmail {
        to: to.to_string(),
        reply_to: None,
        subject: "Admin Password Reset".into(),
        html: markup.into_string(),
    }
}
