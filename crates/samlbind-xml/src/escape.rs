#![forbid(unsafe_code)]

//! Character escaping for serialized XML.
//!
//! The writer and both canonicalizers call into this module, so a tree
//! written out and a tree canonicalized produce the same character data.

#[derive(Clone, Copy, PartialEq, Eq)]
enum Target {
    Text,
    Attribute,
}

fn escape(s: &str, target: Target) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let reference = match (ch, target) {
            ('&', _) => "&amp;",
            ('<', _) => "&lt;",
            ('\r', _) => "&#xD;",
            ('>', Target::Text) => "&gt;",
            ('"', Target::Attribute) => "&quot;",
            ('\t', Target::Attribute) => "&#x9;",
            ('\n', Target::Attribute) => "&#xA;",
            _ => {
                out.push(ch);
                continue;
            }
        };
        out.push_str(reference);
    }
    out
}

/// Character data between tags. `>` is escaped as well, so `]]>` never
/// appears in output.
pub fn escape_text(s: &str) -> String {
    escape(s, Target::Text)
}

/// A double-quoted attribute value. Tabs and line breaks become character
/// references so a parser's attribute-value normalization leaves them alone.
pub fn escape_attr(s: &str) -> String {
    escape(s, Target::Attribute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, QName};

    #[test]
    fn markup_characters() {
        assert_eq!(escape_text("x]]>y & <z>"), "x]]&gt;y &amp; &lt;z&gt;");
        assert_eq!(escape_attr(r#"say "a<b" & go>"#), "say &quot;a&lt;b&quot; &amp; go>");
    }

    #[test]
    fn line_breaks_depend_on_target() {
        assert_eq!(escape_text("a\r\nb\tc"), "a&#xD;\nb\tc");
        assert_eq!(escape_attr("a\r\nb\tc"), "a&#xD;&#xA;b&#x9;c");
    }

    #[test]
    fn attribute_whitespace_survives_a_parse() {
        let el = Element::new(QName::local("e")).with_attr("v", "one\ttwo\nthree");
        let parsed = crate::parse(&crate::writer::to_string(&el)).unwrap();
        assert_eq!(parsed.attr("v"), Some("one\ttwo\nthree"));
    }
}
