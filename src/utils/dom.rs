// src/utils/dom.rs

//! Editable HTML fragments.
//!
//! Statements are parsed with `scraper` and edited directly on its
//! `ego_tree` arena: elements are removed, unwrapped or rebuilt with new
//! attributes, and the result is serialized back through html5ever.
//! Comments are dropped on the way in.

use ego_tree::{NodeId, NodeRef, Tree};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};

/// Elements that stay when empty.
pub const KEEP_WHEN_EMPTY: &[&str] = &["img"];

/// Elements whose leading newline is eaten by the parser.
const NEWLINE_SENSITIVE: &[&str] = &["pre", "textarea", "listing"];

/// What to do with an element visited by [`Fragment::edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Keep,
    Remove,
    /// Replace the element by its children
    Unwrap,
}

/// A parsed HTML fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    html: Html,
}

impl Fragment {
    /// Parse a fragment, dropping elements (and their subtrees) that match
    /// `skip`.
    pub fn parse(html: &str, skip: Option<&Selector>) -> Self {
        let mut fragment = Self {
            html: Html::parse_fragment(html),
        };
        fragment.drop_matching(skip);
        fragment.trim_leading_newlines();
        fragment
    }

    /// Re-parse the contents of an element from a larger document.
    pub fn from_children(parent: ElementRef<'_>, skip: Option<&Selector>) -> Self {
        Self::parse(&parent.inner_html(), skip)
    }

    fn root(&self) -> NodeId {
        self.html.root_element().id()
    }

    fn drop_matching(&mut self, skip: Option<&Selector>) {
        let mut doomed: Vec<NodeId> = self
            .html
            .tree
            .nodes()
            .filter(|node| node.value().is_comment())
            .map(|node| node.id())
            .collect();
        if let Some(selector) = skip {
            doomed.extend(self.html.select(selector).map(|el| el.id()));
        }
        for id in doomed {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    /// The parser eats one newline after `<pre>`; stripping them all keeps a
    /// reparse of the output byte-identical.
    fn trim_leading_newlines(&mut self) {
        let texts: Vec<NodeId> = self
            .html
            .tree
            .nodes()
            .filter(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|el| NEWLINE_SENSITIVE.contains(&el.name()))
            })
            .filter_map(|node| node.first_child())
            .filter(|child| child.value().as_text().is_some_and(|t| t.starts_with('\n')))
            .map(|child| child.id())
            .collect();
        for id in texts {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                if let Node::Text(text) = node.value() {
                    let trimmed = StrTendril::from(text.trim_start_matches('\n'));
                    text.text = trimmed;
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        let root = self.html.root_element();
        !root.children().any(|n| n.value().is_element())
            && root.text().collect::<String>().trim().is_empty()
    }

    /// Visit elements in document order. The callback runs before the
    /// element's children are visited, so children it inserts are visited
    /// too.
    pub fn edit<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut ElementMut<'_>) -> Edit,
    {
        let root = self.root();
        edit_children(&mut self.html.tree, root, &mut f);
    }

    /// Remove elements that have no text and no element children, bottom-up,
    /// so parents emptied by the removal go too. Elements named in `keep`
    /// survive; subtrees rooted at a `protect`ed element are left untouched.
    pub fn prune_empty<P>(&mut self, keep: &[&str], protect: P)
    where
        P: Fn(&Element) -> bool,
    {
        let root = self.root();
        prune_children(&mut self.html.tree, root, keep, &protect);
    }

    pub fn to_html(&self) -> String {
        self.html.root_element().inner_html()
    }
}

/// Mutable handle on one element of a [`Fragment`].
pub struct ElementMut<'a> {
    tree: &'a mut Tree<Node>,
    id: NodeId,
}

impl ElementMut<'_> {
    fn node(&self) -> Option<NodeRef<'_, Node>> {
        self.tree.get(self.id)
    }

    fn element(&self) -> Option<&Element> {
        self.node()?.value().as_element()
    }

    pub fn is(&self, name: &str) -> bool {
        self.element().is_some_and(|el| el.name().eq_ignore_ascii_case(name))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element()?.attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == class))
    }

    /// True if any descendant is a `name` element.
    pub fn contains(&self, name: &str) -> bool {
        self.node().is_some_and(|node| {
            node.descendants().skip(1).any(|n| {
                n.value()
                    .as_element()
                    .is_some_and(|el| el.name().eq_ignore_ascii_case(name))
            })
        })
    }

    /// Set an attribute. The element is rebuilt, which keeps attributes in
    /// the same sorted order the parser produces.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let Some(mut node) = self.tree.get_mut(self.id) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };
        let mut attrs: Vec<Attribute> = element
            .attrs
            .iter()
            .filter(|(key, _)| !(key.ns.is_empty() && &*key.local == name))
            .map(|(key, value)| Attribute {
                name: key.clone(),
                value: value.clone(),
            })
            .collect();
        attrs.push(Attribute {
            name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
            value: StrTendril::from(value),
        });
        *element = Element::new(element.name.clone(), attrs);
    }

    /// Add every whitespace-separated class in `classes` that is missing.
    pub fn add_class(&mut self, classes: &str) {
        let missing: Vec<&str> = classes
            .split_whitespace()
            .filter(|c| !self.has_class(c))
            .collect();
        if missing.is_empty() {
            return;
        }
        let merged = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => {
                format!("{} {}", existing, missing.join(" "))
            }
            _ => missing.join(" "),
        };
        self.set_attr("class", &merged);
    }

    /// Drop the current children and copy in the top-level nodes of `content`.
    pub fn replace_children(&mut self, content: &Fragment) {
        let old: Vec<NodeId> = self
            .node()
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default();
        for id in old {
            if let Some(mut child) = self.tree.get_mut(id) {
                child.detach();
            }
        }
        for source in content.html.root_element().children() {
            let subtree = copy_subtree(source);
            if let Some(mut node) = self.tree.get_mut(self.id) {
                node.append_subtree(subtree);
            }
        }
    }
}

fn copy_subtree(source: NodeRef<'_, Node>) -> Tree<Node> {
    let mut tree = Tree::new(source.value().clone());
    let root = tree.root().id();
    copy_children(source, &mut tree, root);
    tree
}

fn copy_children(source: NodeRef<'_, Node>, tree: &mut Tree<Node>, parent: NodeId) {
    for child in source.children() {
        let Some(mut node) = tree.get_mut(parent) else {
            return;
        };
        let id = node.append(child.value().clone()).id();
        copy_children(child, tree, id);
    }
}

fn child_ids(tree: &Tree<Node>, parent: NodeId) -> Vec<NodeId> {
    tree.get(parent)
        .map(|n| n.children().map(|c| c.id()).collect())
        .unwrap_or_default()
}

fn next_sibling(tree: &Tree<Node>, id: NodeId) -> Option<NodeId> {
    tree.get(id)?.next_sibling().map(|n| n.id())
}

fn edit_children<F>(tree: &mut Tree<Node>, parent: NodeId, f: &mut F)
where
    F: FnMut(&mut ElementMut<'_>) -> Edit,
{
    let mut next = tree.get(parent).and_then(|n| n.first_child()).map(|n| n.id());
    while let Some(id) = next {
        if !tree.get(id).is_some_and(|n| n.value().is_element()) {
            next = next_sibling(tree, id);
            continue;
        }
        let edit = f(&mut ElementMut { tree: &mut *tree, id });
        match edit {
            Edit::Keep => {
                edit_children(tree, id, f);
                next = next_sibling(tree, id);
            }
            Edit::Remove => {
                next = next_sibling(tree, id);
                if let Some(mut node) = tree.get_mut(id) {
                    node.detach();
                }
            }
            Edit::Unwrap => {
                edit_children(tree, id, f);
                next = next_sibling(tree, id);
                let children = child_ids(tree, id);
                if let Some(mut node) = tree.get_mut(id) {
                    for child in children {
                        node.insert_id_before(child);
                    }
                    node.detach();
                }
            }
        }
    }
}

fn prune_children<P>(tree: &mut Tree<Node>, parent: NodeId, keep: &[&str], protect: &P)
where
    P: Fn(&Element) -> bool,
{
    for id in child_ids(tree, parent) {
        let protected = match tree.get(id).and_then(|n| n.value().as_element()) {
            Some(el) => protect(el),
            None => continue,
        };
        if protected {
            continue;
        }
        prune_children(tree, id, keep, protect);
        if tree.get(id).is_some_and(|n| is_empty_leaf(n, keep)) {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// No text, no element children, and not in `keep`.
fn is_empty_leaf(node: NodeRef<'_, Node>, keep: &[&str]) -> bool {
    let Some(element) = ElementRef::wrap(node) else {
        return false;
    };
    let name = element.value().name();
    !keep.iter().any(|k| k.eq_ignore_ascii_case(name))
        && !node.children().any(|c| c.value().is_element())
        && element.text().collect::<String>().trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(html: &str) -> String {
        Fragment::parse(html, None).to_html()
    }

    #[test]
    fn test_parse_and_serialize() {
        assert_eq!(
            roundtrip(r#"<p class="a">x &amp; y<br><img src="/i.png"></p>"#),
            r#"<p class="a">x &amp; y<br><img src="/i.png"></p>"#
        );
    }

    #[test]
    fn test_comments_dropped() {
        assert_eq!(roundtrip("<p>a<!-- hidden -->b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_pre_output_is_stable() {
        let once = roundtrip("<pre>\n\n1 2\n</pre>");
        assert_eq!(once, "<pre>1 2\n</pre>");
        assert_eq!(roundtrip(&once), once);
    }

    #[test]
    fn test_foreign_and_template_content_survive() {
        let svg = r##"<svg><use xlink:href="#a"></use></svg>"##;
        assert_eq!(roundtrip(svg), svg);
        assert_eq!(roundtrip(&roundtrip(svg)), svg);

        let template = "<template><b>x</b></template>";
        assert_eq!(roundtrip(template), template);
    }

    #[test]
    fn test_skip_selector() {
        let skip = Selector::parse("script, .navbar").unwrap();
        let fragment = Fragment::parse(
            r#"<div><script>x()</script><div class="navbar">n</div><p>keep</p></div>"#,
            Some(&skip),
        );
        assert_eq!(fragment.to_html(), "<div><p>keep</p></div>");
    }

    #[test]
    fn test_add_class_is_idempotent() {
        let mut fragment = Fragment::parse("<a>x</a>", None);
        fragment.edit(|el| {
            el.add_class("x y");
            el.add_class("y z");
            el.add_class("x y z");
            Edit::Keep
        });
        assert_eq!(fragment.to_html(), r#"<a class="x y z">x</a>"#);
    }

    #[test]
    fn test_set_attr_keeps_parser_order() {
        let mut fragment = Fragment::parse(r#"<a href="/a">x</a>"#, None);
        fragment.edit(|el| {
            el.set_attr("target", "_blank");
            el.set_attr("class", "c");
            el.set_attr("href", "/b");
            Edit::Keep
        });
        let once = fragment.to_html();
        assert_eq!(once, r#"<a class="c" href="/b" target="_blank">x</a>"#);
        assert_eq!(roundtrip(&once), once);
    }

    #[test]
    fn test_prune_empty_is_recursive() {
        let mut fragment = Fragment::parse(
            r#"<div><p> <span></span> </p><p><img src="a.png"></p><p>t<br></p></div>"#,
            None,
        );
        fragment.prune_empty(KEEP_WHEN_EMPTY, |_| false);
        assert_eq!(
            fragment.to_html(),
            r#"<div><p><img src="a.png"></p><p>t</p></div>"#
        );
    }

    #[test]
    fn test_prune_respects_protect() {
        let mut fragment = Fragment::parse(r#"<a class="keep"><b></b></a><i></i>"#, None);
        fragment.prune_empty(&[], |el| el.attr("class") == Some("keep"));
        assert_eq!(fragment.to_html(), r#"<a class="keep"><b></b></a>"#);
    }

    #[test]
    fn test_edit_unwrap_and_remove() {
        let mut fragment = Fragment::parse("<p><a>in <b>bold</b></a><i>gone</i></p>", None);
        fragment.edit(|el| {
            if el.is("a") {
                Edit::Unwrap
            } else if el.is("i") {
                Edit::Remove
            } else {
                Edit::Keep
            }
        });
        assert_eq!(fragment.to_html(), "<p>in <b>bold</b></p>");
    }

    #[test]
    fn test_replace_children_and_contains() {
        let content = Fragment::parse("<span>PDF</span>", None);
        let mut fragment = Fragment::parse(r#"<a><img src="x">old</a>"#, None);
        let mut had_img = false;
        fragment.edit(|el| {
            if el.is("a") {
                had_img = el.contains("img");
                el.replace_children(&content);
            }
            Edit::Keep
        });
        assert!(had_img);
        assert_eq!(fragment.to_html(), "<a><span>PDF</span></a>");
    }

    #[test]
    fn test_blank() {
        assert!(Fragment::parse("  \n ", None).is_blank());
        assert!(!Fragment::parse("<p></p>", None).is_blank());
    }
}
