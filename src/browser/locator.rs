use crate::browser::driver::{Browser, By, ElementHandle, Query};
use crate::case::case_model::SelectorKind;
use crate::error::{ReplayError, Result};

/// Translate a declarative selector into a backend query.
///
/// `placeholder` becomes an attribute xpath; every other kind maps 1:1.
pub fn resolve_query(kind: SelectorKind, value: &str) -> Query {
    match kind {
        SelectorKind::Id => Query::new(By::Id, value),
        SelectorKind::Name => Query::new(By::Name, value),
        SelectorKind::Xpath => Query::new(By::Xpath, value),
        SelectorKind::CssSelector => Query::new(By::Css, value),
        SelectorKind::ClassName => Query::new(By::ClassName, value),
        SelectorKind::TagName => Query::new(By::TagName, value),
        SelectorKind::LinkText => Query::new(By::LinkText, value),
        SelectorKind::PartialLinkText => Query::new(By::PartialLinkText, value),
        SelectorKind::Placeholder => Query::new(By::Xpath, placeholder_xpath(value)),
    }
}

pub fn placeholder_xpath(value: &str) -> String {
    format!("//*[@placeholder='{}']", value)
}

/// Return the `index`-th element matching the selector.
///
/// Performs exactly one query; zero matches or an index past the end is
/// [`ReplayError::ElementNotFound`].
pub fn find_element<B: Browser + ?Sized>(
    browser: &mut B,
    kind: SelectorKind,
    value: &str,
    index: usize,
) -> Result<ElementHandle> {
    let query = resolve_query(kind, value);
    let mut elements = browser.find_elements(&query)?;
    if index < elements.len() {
        Ok(elements.swap_remove(index))
    } else {
        Err(ReplayError::ElementNotFound {
            kind,
            value: value.to_string(),
            index,
        })
    }
}
