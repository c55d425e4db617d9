//! The in-memory tree a [`super::Builder`] accumulates before serialization.

/// One element accumulated by the builder, prior to compilation into a
/// silo. Kept deliberately close to the wire shape (name, text,
/// attributes, children) so the serializer's traversal matches this
/// tree's traversal one-to-one.
#[derive(Debug, Clone)]
pub struct BuilderNode {
    pub tag: String,
    pub text: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<BuilderNode>,
    /// `xml:lang`/`lang` attribute value, consulted by `NATIVE_LANGS`
    /// filtering. Not stripped from `attributes` — canonicalization only
    /// decides which *siblings* survive, not whether the survivor keeps
    /// its own lang attribute.
    pub lang: Option<String>,
}

impl BuilderNode {
    pub fn new(tag: String) -> BuilderNode {
        BuilderNode {
            tag,
            text: None,
            attributes: Vec::new(),
            children: Vec::new(),
            lang: None,
        }
    }

    pub fn push_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }
}
