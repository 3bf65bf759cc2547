//! The static hands-on page
//!
//! The page is a fixed bundle of strings rendered through an askama
//! template. Three of them (title, heading, control label) are what the
//! verifier asserts against, so they live here as constants that both
//! sides can name.

use askama::Template;
use serde::{Deserialize, Serialize};

use crate::error::{WebError, WebResult};

pub const HOME_TITLE: &str = "最初のページ";
pub const HOME_DESCRIPTION: &str = "Playwrightハンズオンの初期ステップ";
pub const HOME_HEADING: &str = "Playwrightハンズオン";
pub const HOME_BODY: &str = "あなたは1週間後にE2Eのエキスパートです。";
pub const HOME_CONTROL_LABEL: &str = "操作ボタン";

/// Everything the page displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Document `<title>`
    pub title: String,

    /// `<meta name="description">` content
    pub description: String,

    /// Text of the single level-1 heading
    pub heading: String,

    /// Descriptive paragraph under the heading
    pub body: String,

    /// Visible label of the button
    pub control_label: String,
}

impl PageDescriptor {
    /// The canonical hands-on page
    pub fn home() -> Self {
        Self {
            title: HOME_TITLE.to_string(),
            description: HOME_DESCRIPTION.to_string(),
            heading: HOME_HEADING.to_string(),
            body: HOME_BODY.to_string(),
            control_label: HOME_CONTROL_LABEL.to_string(),
        }
    }

    /// Same page with a different heading
    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }
}

impl Default for PageDescriptor {
    fn default() -> Self {
        Self::home()
    }
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    page: &'a PageDescriptor,
}

/// Render a descriptor to a full HTML document
pub fn render(page: &PageDescriptor) -> WebResult<String> {
    PageTemplate { page }
        .render()
        .map_err(|e| WebError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_renders_contract_strings() {
        let html = render(&PageDescriptor::home()).unwrap();

        assert!(html.contains("<title>最初のページ</title>"));
        assert!(html.contains(">Playwrightハンズオン</h1>"));
        assert!(html.contains(">操作ボタン</button>"));
        assert!(html.contains(r#"<meta name="description" content="Playwrightハンズオンの初期ステップ">"#));
        assert!(html.contains("あなたは1週間後にE2Eのエキスパートです。"));
    }

    #[test]
    fn test_single_heading_and_button() {
        let html = render(&PageDescriptor::home()).unwrap();

        assert_eq!(html.matches("<h1").count(), 1);
        assert_eq!(html.matches("<button").count(), 1);
        assert!(!html.contains("disabled"));
        assert!(!html.contains("hidden"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let page = PageDescriptor::home();
        assert_eq!(render(&page).unwrap(), render(&page).unwrap());
    }

    #[test]
    fn test_fields_are_escaped() {
        let page = PageDescriptor::home().with_heading("<script>alert(1)</script>");
        let html = render(&page).unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
