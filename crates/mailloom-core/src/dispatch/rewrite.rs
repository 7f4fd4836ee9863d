//! Link rewriting - open pixel injection and click redirect rewriting
//!
//! The rewriter is a string-level transform over the HTML body. It does
//! not parse HTML: anchors and buttons are matched with case-insensitive
//! regexes, which is the documented contract for malformed markup too
//! (an unterminated tag is left untouched).

use mailloom_common::types::TrackingLogId;
use regex::{NoExpand, Regex};

/// Rewrites an email body for engagement tracking
#[derive(Clone)]
pub struct LinkRewriter {
    base_url: String,
    closing_body: Regex,
    clickable: Regex,
    href_attr: Regex,
}

impl LinkRewriter {
    /// Create a new rewriter pointing at the public tracking base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            closing_body: Regex::new(r"(?i)</body>").unwrap(),
            clickable: Regex::new(r"(?i)<(a|button)\b([^>]*)>").unwrap(),
            href_attr: Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap(),
        }
    }

    /// The URL an open pixel points at
    pub fn open_url(&self, tracking_id: TrackingLogId) -> String {
        format!("{}/track/open/{}", self.base_url, tracking_id)
    }

    /// The redirect URL a rewritten link points at
    pub fn click_url(&self, tracking_id: TrackingLogId, destination: &str, recipient: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", destination)
            .append_pair("recipient", recipient)
            .finish();
        format!("{}/track/click/{}?{}", self.base_url, tracking_id, query)
    }

    /// Apply the enabled rewrites to a body
    pub fn apply(
        &self,
        body: &str,
        recipient: &str,
        open_id: Option<TrackingLogId>,
        click_id: Option<TrackingLogId>,
    ) -> String {
        let mut result = match click_id {
            Some(id) => self.rewrite_click_links(body, id, recipient),
            None => body.to_string(),
        };
        if let Some(id) = open_id {
            result = self.inject_open_pixel(&result, id);
        }
        result
    }

    /// Insert a 1x1 invisible pixel immediately before the closing body
    /// tag, or at the end of the body when no closing tag exists.
    pub fn inject_open_pixel(&self, body: &str, tracking_id: TrackingLogId) -> String {
        let pixel = format!(
            r#"<img src="{}" width="1" height="1" alt="" style="display:none;" />"#,
            self.open_url(tracking_id)
        );

        match self.closing_body.find(body) {
            Some(m) => {
                let mut result = String::with_capacity(body.len() + pixel.len());
                result.push_str(&body[..m.start()]);
                result.push_str(&pixel);
                result.push_str(&body[m.start()..]);
                result
            }
            None => format!("{}{}", body, pixel),
        }
    }

    /// Rewrite every anchor/button href to the click redirect URL,
    /// preserving inner content and other attributes. An element with no
    /// href gets destination `#`.
    pub fn rewrite_click_links(
        &self,
        body: &str,
        tracking_id: TrackingLogId,
        recipient: &str,
    ) -> String {
        self.clickable
            .replace_all(body, |caps: &regex::Captures<'_>| {
                let tag = &caps[1];
                let attrs = &caps[2];

                match self.href_attr.captures(attrs) {
                    Some(href) => {
                        let destination = href
                            .get(1)
                            .or_else(|| href.get(2))
                            .map(|m| m.as_str())
                            .filter(|d| !d.is_empty())
                            .unwrap_or("#");
                        let replacement = format!(
                            r#"href="{}""#,
                            self.click_url(tracking_id, destination, recipient)
                        );
                        let attrs = self.href_attr.replace(attrs, NoExpand(&replacement));
                        format!("<{}{}>", tag, attrs)
                    }
                    None => format!(
                        r#"<{}{} href="{}">"#,
                        tag,
                        attrs,
                        self.click_url(tracking_id, "#", recipient)
                    ),
                }
            })
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn rewriter() -> LinkRewriter {
        LinkRewriter::new("https://track.example.com/")
    }

    #[test]
    fn test_identity_without_tracking() {
        let body = "<html><body><p>plain text, no links</p></body></html>";
        let out = rewriter().apply(body, "jo@example.com", None, None);
        assert_eq!(out, body);
    }

    #[test]
    fn test_pixel_before_closing_body() {
        let id = Uuid::new_v4();
        let out = rewriter().inject_open_pixel("<body><p>hi</p></body>", id);
        let pixel_at = out.find("<img").unwrap();
        let body_close_at = out.find("</body>").unwrap();
        assert!(pixel_at < body_close_at);
        assert!(out.contains(&format!("https://track.example.com/track/open/{}", id)));
    }

    #[test]
    fn test_pixel_closing_body_case_insensitive() {
        let id = Uuid::new_v4();
        let out = rewriter().inject_open_pixel("<BODY>hi</BODY>", id);
        assert!(out.ends_with("</BODY>"));
        assert!(out.contains("<img"));
    }

    #[test]
    fn test_pixel_appended_without_body_tag() {
        let id = Uuid::new_v4();
        let out = rewriter().inject_open_pixel("<p>fragment</p>", id);
        assert!(out.starts_with("<p>fragment</p><img"));
    }

    #[test]
    fn test_click_rewrite_embeds_original_url() {
        let id = Uuid::new_v4();
        let out = rewriter().rewrite_click_links(
            r#"<a href="https://x">go</a>"#,
            id,
            "jo@example.com",
        );
        assert!(out.contains(&format!("/track/click/{}", id)));
        assert!(out.contains("redirect=https%3A%2F%2Fx"));
        assert!(out.contains("recipient=jo%40example.com"));
        assert!(out.ends_with(">go</a>"));
    }

    #[test]
    fn test_click_rewrite_preserves_other_attributes() {
        let id = Uuid::new_v4();
        let out = rewriter().rewrite_click_links(
            r#"<a class="btn" href="https://x" target="_blank">go</a>"#,
            id,
            "jo@example.com",
        );
        assert!(out.contains(r#"class="btn""#));
        assert!(out.contains(r#"target="_blank""#));
        assert!(!out.contains(r#"href="https://x""#));
    }

    #[test]
    fn test_click_rewrite_case_insensitive() {
        let id = Uuid::new_v4();
        let out = rewriter().rewrite_click_links(
            r#"<A HREF='https://x'>go</A>"#,
            id,
            "jo@example.com",
        );
        assert!(out.contains(&format!("/track/click/{}", id)));
    }

    #[test]
    fn test_click_rewrite_button() {
        let id = Uuid::new_v4();
        let out =
            rewriter().rewrite_click_links(r#"<button href="https://x">go</button>"#, id, "jo@x");
        assert!(out.contains(&format!("/track/click/{}", id)));
    }

    #[test]
    fn test_missing_href_becomes_hash() {
        let id = Uuid::new_v4();
        let out = rewriter().rewrite_click_links("<a>go</a>", id, "jo@x");
        assert!(out.contains("redirect=%23"));
    }

    #[test]
    fn test_empty_href_becomes_hash() {
        let id = Uuid::new_v4();
        let out = rewriter().rewrite_click_links(r#"<a href="">go</a>"#, id, "jo@x");
        assert!(out.contains("redirect=%23"));
    }

    #[test]
    fn test_unterminated_tag_left_alone() {
        let id = Uuid::new_v4();
        let body = r#"<a href="https://x"#;
        let out = rewriter().rewrite_click_links(body, id, "jo@x");
        assert_eq!(out, body);
    }

    #[test]
    fn test_deterministic_given_ids() {
        let open_id = Uuid::new_v4();
        let click_id = Uuid::new_v4();
        let body = r#"<body><a href="https://x">go</a></body>"#;
        let first = rewriter().apply(body, "jo@x", Some(open_id), Some(click_id));
        let second = rewriter().apply(body, "jo@x", Some(open_id), Some(click_id));
        assert_eq!(first, second);
    }
}
