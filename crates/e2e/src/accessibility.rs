//! Role, name and visibility queries over a static HTML document
//!
//! A browserless stand-in for the parts of the accessibility tree that
//! `getByRole` relies on. Only implicit roles of common elements, explicit
//! `role` attributes, `aria-label`/`aria-labelledby` names and statically
//! visible hiding (attributes and inline styles) are modelled. There is no
//! layout, so zero-size elements count as visible.

use scraper::{ElementRef, Html, Selector};

use crate::error::{E2eError, E2eResult};

/// An element exposed with a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibleNode {
    pub role: String,
    /// Computed accessible name, whitespace-normalized
    pub name: String,
    /// Text content, whitespace-normalized
    pub text: String,
    /// `aria-level` or the `hN` level, for headings
    pub level: Option<u8>,
    /// Hidden from the accessibility tree (self or an ancestor)
    pub hidden: bool,
    pub disabled: bool,
}

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// `document.title`: text of the first `<title>`, whitespace-normalized
    pub fn title(&self) -> E2eResult<String> {
        let selector = parse_selector("title")?;
        Ok(self
            .html
            .select(&selector)
            .next()
            .map(|el| normalize(&el.text().collect::<String>()))
            .unwrap_or_default())
    }

    /// All elements whose computed role is `role`, in document order
    pub fn by_role(&self, role: &str) -> E2eResult<Vec<AccessibleNode>> {
        let all = parse_selector("body *")?;
        let mut nodes = Vec::new();

        for el in self.html.select(&all) {
            let Some(el_role) = element_role(&el) else {
                continue;
            };
            if el_role != role {
                continue;
            }

            nodes.push(AccessibleNode {
                level: heading_level(&el),
                name: self.accessible_name(&el)?,
                text: normalize(&el.text().collect::<String>()),
                hidden: is_hidden(&el),
                disabled: is_disabled(&el),
                role: el_role,
            });
        }

        Ok(nodes)
    }

    fn accessible_name(&self, el: &ElementRef<'_>) -> E2eResult<String> {
        if let Some(ids) = el.value().attr("aria-labelledby") {
            let name = self.text_of_ids(ids)?;
            if !name.is_empty() {
                return Ok(name);
            }
        }

        if let Some(label) = el.value().attr("aria-label") {
            let label = normalize(label);
            if !label.is_empty() {
                return Ok(label);
            }
        }

        if el.value().name() == "input" {
            if let Some(value) = el.value().attr("value") {
                return Ok(normalize(value));
            }
            let default = match el.value().attr("type").map(str::to_ascii_lowercase).as_deref() {
                Some("submit") => "Submit",
                Some("reset") => "Reset",
                _ => "",
            };
            return Ok(default.to_string());
        }

        Ok(normalize(&el.text().collect::<String>()))
    }

    fn text_of_ids(&self, ids: &str) -> E2eResult<String> {
        let with_id = parse_selector("[id]")?;
        let mut parts = Vec::new();

        for id in ids.split_whitespace() {
            if let Some(target) = self
                .html
                .select(&with_id)
                .find(|el| el.value().attr("id") == Some(id))
            {
                parts.push(normalize(&target.text().collect::<String>()));
            }
        }

        Ok(parts.join(" "))
    }
}

fn parse_selector(css: &str) -> E2eResult<Selector> {
    Selector::parse(css).map_err(|e| E2eError::Query(format!("{}: {:?}", css, e)))
}

/// Collapse runs of whitespace and trim, like `innerText` comparisons do
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_role(el: &ElementRef<'_>) -> Option<String> {
    if let Some(role) = el.value().attr("role") {
        if let Some(first) = role.split_whitespace().next() {
            return Some(first.to_ascii_lowercase());
        }
    }

    let role = match el.value().name() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "button" => "button",
        "input" => match el
            .value()
            .attr("type")
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("button") | Some("submit") | Some("reset") | Some("image") => "button",
            Some("checkbox") => "checkbox",
            Some("radio") => "radio",
            _ => "textbox",
        },
        "a" if el.value().attr("href").is_some() => "link",
        "main" => "main",
        "nav" => "navigation",
        "p" => "paragraph",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "img" => "img",
        "textarea" => "textbox",
        _ => return None,
    };

    Some(role.to_string())
}

fn heading_level(el: &ElementRef<'_>) -> Option<u8> {
    if let Some(level) = el.value().attr("aria-level").and_then(|v| v.trim().parse().ok()) {
        return Some(level);
    }

    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ if el.value().attr("role") == Some("heading") => Some(2),
        _ => None,
    }
}

fn hides_itself(el: &ElementRef<'_>) -> bool {
    let value = el.value();

    if value.attr("hidden").is_some() {
        return true;
    }
    if value.attr("aria-hidden").map(|v| v.trim().eq_ignore_ascii_case("true")) == Some(true) {
        return true;
    }

    value
        .attr("style")
        .map(|style| {
            style.split(';').any(|decl| {
                let Some((prop, val)) = decl.split_once(':') else {
                    return false;
                };
                let prop = prop.trim().to_ascii_lowercase();
                let val = val.trim().to_ascii_lowercase();
                (prop == "display" && val == "none")
                    || (prop == "visibility" && (val == "hidden" || val == "collapse"))
            })
        })
        .unwrap_or(false)
}

fn is_hidden(el: &ElementRef<'_>) -> bool {
    hides_itself(el)
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| hides_itself(&ancestor))
}

fn is_disabled(el: &ElementRef<'_>) -> bool {
    let value = el.value();
    value.attr("disabled").is_some()
        || value.attr("aria-disabled").map(|v| v.trim().eq_ignore_ascii_case("true")) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const HOME: &str = r#"<!DOCTYPE html>
<html lang="ja">
<head><title>
  最初のページ
</title></head>
<body>
  <main class="min-h-screen p-8">
    <h1 class="text-4xl">Playwrightハンズオン</h1>
    <p>あなたは1週間後にE2Eのエキスパートです。</p>
    <p><button class="bg-blue-500">
      操作ボタン
    </button></p>
  </main>
</body>
</html>"#;

    #[test]
    fn test_title_is_normalized() {
        let doc = Document::parse(HOME);
        assert_eq!(doc.title().unwrap(), "最初のページ");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let doc = Document::parse("<html><body></body></html>");
        assert_eq!(doc.title().unwrap(), "");
    }

    #[test]
    fn test_heading_role_and_level() {
        let doc = Document::parse(HOME);
        let headings = doc.by_role("heading").unwrap();

        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].level, Some(1));
        assert_eq!(headings[0].text, "Playwrightハンズオン");
        assert!(!headings[0].hidden);
    }

    #[test]
    fn test_button_name_from_content() {
        let doc = Document::parse(HOME);
        let buttons = doc.by_role("button").unwrap();

        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].name, "操作ボタン");
        assert!(!buttons[0].disabled);
    }

    #[test_case(r#"<button aria-label="閉じる">×</button>"#, "閉じる" ; "aria label wins")]
    #[test_case(r#"<span id="l">送信</span><button aria-labelledby="l">→</button>"#, "送信" ; "labelledby wins")]
    #[test_case(r#"<input type="submit" value="Go">"#, "Go" ; "input value")]
    #[test_case(r#"<input type="submit">"#, "Submit" ; "submit default")]
    #[test_case(r#"<div role="button">Custom</div>"#, "Custom" ; "explicit role")]
    fn test_button_names(body: &str, expected: &str) {
        let doc = Document::parse(&format!("<html><body>{}</body></html>", body));
        let buttons = doc.by_role("button").unwrap();

        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].name, expected);
    }

    #[test_case(r#"<button hidden>x</button>"# ; "hidden attribute")]
    #[test_case(r#"<button aria-hidden="true">x</button>"# ; "aria hidden")]
    #[test_case(r#"<button style="display: none">x</button>"# ; "display none")]
    #[test_case(r#"<button style="color:red; visibility:hidden">x</button>"# ; "visibility hidden")]
    #[test_case(r#"<div style="display:none"><button>x</button></div>"# ; "hidden ancestor")]
    fn test_hidden_buttons(body: &str) {
        let doc = Document::parse(&format!("<html><body>{}</body></html>", body));
        let buttons = doc.by_role("button").unwrap();

        assert_eq!(buttons.len(), 1);
        assert!(buttons[0].hidden);
    }

    #[test]
    fn test_disabled_button() {
        let doc = Document::parse("<html><body><button disabled>x</button></body></html>");
        assert!(doc.by_role("button").unwrap()[0].disabled);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  a \n b\t c "), "a b c");
    }
}
