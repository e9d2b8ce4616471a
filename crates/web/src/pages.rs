//! Minimal HTML pages rendered by the handlers.

use axum::response::Html;
use hlbridge_contacts::ContactUpdate;

/// Escapes text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    ))
}

/// Error page. `detail` is shown verbatim inside a `<pre>` block.
#[must_use]
pub fn error(title: &str, detail: Option<&str>, login_link: bool) -> Html<String> {
    let mut body = format!("<h1>{}</h1>", escape(title));
    if let Some(detail) = detail {
        body.push_str(&format!("\n<pre>{}</pre>", escape(detail)));
    }
    if login_link {
        body.push_str("\n<p><a href=\"/login\">Login</a></p>");
    }
    layout(title, &body)
}

#[must_use]
pub fn dashboard(location_id: &str, access_token: &str) -> Html<String> {
    let body = format!(
        "<h1>Dashboard</h1>\n<p>Location ID: <code>{}</code></p>\n<p>Access token: <code>{}</code></p>\n<p><a href=\"/update-contact\">Update a random contact</a></p>",
        escape(location_id),
        escape(access_token),
    );
    layout("Dashboard", &body)
}

#[must_use]
pub fn contact_updated(update: &ContactUpdate) -> Html<String> {
    let response =
        serde_json::to_string_pretty(&update.response).unwrap_or_else(|_| update.response.to_string());
    let body = format!(
        "<h1>Contact updated</h1>\n<p>Contact ID: <code>{}</code></p>\n<p>Custom field: {} (<code>{}</code>)</p>\n<pre>{}</pre>\n<p><a href=\"/dashboard\">Back to dashboard</a></p>",
        escape(&update.contact_id),
        escape(&update.custom_field_name),
        escape(&update.custom_field_id),
        escape(&response),
    );
    layout("Contact updated", &body)
}
