//! Selector-based text extraction from XML responses.
//!
//! Uses quick-xml's namespace-aware reader, which does not expand external
//! entities.
//!
//! ### Selector syntax
//!
//! Whitespace-separated steps combined as descendant selectors, each either
//! `prefix|local` or `local`:
//!
//! ```text
//! S|Envelope S|Body wst|RequestSecurityTokenResponse wst|RequestedSecurityToken wsse|BinarySecurityToken
//! ```
//!
//! A prefixed step matches elements whose namespace equals the one bound to
//! that prefix where the element appears. When the prefix is not declared
//! there, the literal qualified name is compared instead. Unprefixed steps
//! match on local name alone.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};
use spfed_core::Error;

#[derive(Debug)]
struct Step {
    local: String,
    /// `prefix:local`, present for prefixed steps.
    qname: Option<String>,
}

fn parse_selector(selector: &str) -> Result<Vec<Step>, Error> {
    let steps: Vec<Step> = selector
        .split_whitespace()
        .map(|raw| match raw.split_once('|') {
            Some((prefix, local)) if !prefix.is_empty() => {
                Step { local: local.to_string(), qname: Some(format!("{prefix}:{local}")) }
            }
            Some((_, local)) => Step { local: local.to_string(), qname: None },
            None => Step { local: raw.to_string(), qname: None },
        })
        .collect();

    if steps.is_empty() || steps.iter().any(|s| s.local.is_empty()) {
        return Err(Error::Parse(format!("invalid selector: {selector:?}")));
    }

    Ok(steps)
}

fn step_matches(reader: &NsReader<&[u8]>, step: &Step, element: &BytesStart<'_>, element_ns: Option<&[u8]>) -> bool {
    if element.local_name().as_ref() != step.local.as_bytes() {
        return false;
    }

    let Some(qname) = &step.qname else {
        return true;
    };

    match reader.resolve_element(QName(qname.as_bytes())).0 {
        ResolveResult::Bound(ns) => element_ns == Some(ns.0),
        _ => element.name().as_ref() == qname.as_bytes(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of the first element matching `selector`.
///
/// Returns an empty string when nothing matches. The whole document is read
/// even after a match so malformed trailing content is still reported.
///
/// # Errors
///
/// Returns `Error::Parse` if the document is malformed, has no root element,
/// or the selector is empty.
pub fn extract_node(xml: &str, selector: &str) -> Result<String, Error> {
    let steps = parse_selector(selector)?;

    let mut reader = NsReader::from_str(xml);

    // Per open element: how many selector steps its ancestor chain has matched.
    let mut progress: Vec<usize> = Vec::new();
    // Depth of the element being captured and the text gathered so far.
    let mut capture: Option<(usize, String)> = None;
    let mut found: Option<String> = None;
    let mut seen_root = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| Error::Parse(e.to_string()))?;
        let element_ns = match ns {
            ResolveResult::Bound(ns) => Some(ns.0.to_vec()),
            _ => None,
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if progress.is_empty() && seen_root {
                    return Err(Error::Parse("multiple root elements".to_string()));
                }
                seen_root = true;

                let parent = progress.last().copied().unwrap_or(0);
                let matched = parent < steps.len() && step_matches(&reader, &steps[parent], e, element_ns.as_deref());
                let current = if matched { parent + 1 } else { parent };
                let is_hit = matched && current == steps.len() && found.is_none() && capture.is_none();

                if matches!(event, Event::Start(_)) {
                    progress.push(current);
                    if is_hit {
                        capture = Some((progress.len(), String::new()));
                    }
                } else if is_hit {
                    found = Some(String::new());
                }
            }
            Event::End(_) => {
                if let Some((depth, text)) = capture.take() {
                    if depth == progress.len() {
                        found = Some(collapse_whitespace(&text));
                    } else {
                        capture = Some((depth, text));
                    }
                }
                if progress.pop().is_none() {
                    return Err(Error::Parse("unexpected closing tag".to_string()));
                }
            }
            Event::Text(ref t) => {
                if progress.is_empty() && !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::Parse("text outside the root element".to_string()));
                }
                if let Some((_, text)) = capture.as_mut() {
                    let unescaped = t.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(ref c) => {
                if progress.is_empty() {
                    return Err(Error::Parse("CDATA outside the root element".to_string()));
                }
                if let Some((_, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(Error::Parse("document has no root element".to_string()));
    }
    if !progress.is_empty() {
        return Err(Error::Parse(format!("{} unclosed element(s) at end of document", progress.len())));
    }

    Ok(found.unwrap_or_default())
}
