//! Personalization of email content

use mailloom_storage::models::Contact;
use regex::Regex;

/// Render a subject or body template with contact data.
///
/// Supported placeholders: `{{email}}`, `{{name}}`, `{{first_name}}`,
/// `{{last_name}}`. Unknown placeholders are stripped.
pub fn render(template: &str, contact: &Contact) -> String {
    let mut result = template.to_string();

    result = result.replace("{{email}}", &contact.email);
    result = result.replace("{{name}}", &contact.display_name());
    result = result.replace("{{first_name}}", contact.first_name.as_deref().unwrap_or(""));
    result = result.replace("{{last_name}}", contact.last_name.as_deref().unwrap_or(""));

    remove_unused_placeholders(&result)
}

/// Remove unused placeholder variables
fn remove_unused_placeholders(content: &str) -> String {
    let re = Regex::new(r"\{\{[^}]+\}\}").unwrap();
    re.replace_all(content, "").to_string()
}
