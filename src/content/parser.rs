// SPDX-License-Identifier: MPL-2.0
//! Content-map XML parsing.
//!
//! The map is a nested document of `root`/`branch`/`leaf` elements. Any
//! element carrying an `id` and at least one element child is addressable
//! and becomes a [`ContentNode`]; a child with a `label` attribute renders
//! as a text row of its parent (navigable when the child is itself
//! addressable), and a child with a `url` attribute describes the parent's
//! image content.

use super::{ContentNode, ContentTree, ImageSpec, LinkSpec, NodeId, NodeKind};
use crate::error::{ContentError, Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

const ATTRIBUTE_ID: &[u8] = b"id";
const ATTRIBUTE_LABEL: &[u8] = b"label";
const ATTRIBUTE_URL: &[u8] = b"url";
const ATTRIBUTE_WIDTH: &[u8] = b"width";
const ATTRIBUTE_HEIGHT: &[u8] = b"height";
const ATTRIBUTE_ZOOMABLE: &[u8] = b"zoomable";
const ATTRIBUTE_HREF: &[u8] = b"href";
const ATTRIBUTE_DOWNLOAD: &[u8] = b"download";
const ATTRIBUTE_FOOTNOTE: &[u8] = b"footnote";

/// Raw attributes of one map element.
#[derive(Debug, Default)]
struct ElementAttrs {
    id: Option<String>,
    label: Option<String>,
    url: Option<String>,
    width: Option<String>,
    height: Option<String>,
    zoomable: bool,
    href: Option<String>,
    download: bool,
    footnote: bool,
}

/// One open element while walking the document.
#[derive(Debug)]
struct Frame {
    kind: Option<NodeKind>,
    attrs: ElementAttrs,
    links: Vec<LinkSpec>,
    image: Option<ImageSpec>,
    has_element_children: bool,
}

/// Parses a content map into a [`ContentTree`].
///
/// # Errors
///
/// Returns [`Error::Xml`] for malformed XML or unparseable image
/// dimensions, and [`Error::Content`] when the document has no `root`
/// element, the root is childless, or two nodes share an id.
pub fn parse(xml: &str) -> Result<ContentTree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut nodes: HashMap<NodeId, ContentNode> = HashMap::new();
    let mut root: Option<NodeId> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                stack.push(open_frame(&element)?);
            }
            Event::Empty(element) => {
                let frame = open_frame(&element)?;
                close_frame(frame, &mut stack, &mut nodes, &mut root)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                close_frame(frame, &mut stack, &mut nodes, &mut root)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let root = root.ok_or(ContentError::MissingRoot)?;
    Ok(ContentTree::new(root, nodes))
}

fn open_frame(element: &BytesStart<'_>) -> Result<Frame> {
    let kind = match element.name().as_ref() {
        b"root" => Some(NodeKind::Root),
        b"branch" => Some(NodeKind::Branch),
        b"leaf" => Some(NodeKind::Leaf),
        _ => None,
    };

    let mut attrs = ElementAttrs::default();

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| Error::Xml(e.to_string()))?;
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?
            .into_owned();

        match attribute.key.as_ref() {
            ATTRIBUTE_ID => attrs.id = Some(value),
            ATTRIBUTE_LABEL => attrs.label = Some(value),
            ATTRIBUTE_URL => attrs.url = Some(value),
            ATTRIBUTE_WIDTH => attrs.width = Some(value),
            ATTRIBUTE_HEIGHT => attrs.height = Some(value),
            ATTRIBUTE_ZOOMABLE => attrs.zoomable = flag(&value),
            ATTRIBUTE_HREF => attrs.href = Some(value),
            ATTRIBUTE_DOWNLOAD => attrs.download = true,
            ATTRIBUTE_FOOTNOTE => attrs.footnote = true,
            _ => {}
        }
    }

    Ok(Frame {
        kind,
        attrs,
        links: Vec::new(),
        image: None,
        has_element_children: false,
    })
}

/// Closes an element: registers it as a tree node when addressable and
/// records it in its parent as a link row or image descriptor.
fn close_frame(
    frame: Frame,
    stack: &mut Vec<Frame>,
    nodes: &mut HashMap<NodeId, ContentNode>,
    root: &mut Option<NodeId>,
) -> Result<()> {
    let registered_id = register_node(&frame, nodes)?;

    if let Some(parent) = stack.last_mut() {
        parent.has_element_children = true;

        if let Some(label) = frame.attrs.label.clone() {
            parent.links.push(LinkSpec {
                label,
                target: registered_id.clone(),
                href: frame.attrs.href.clone(),
                download: frame.attrs.download,
                footnote: frame.attrs.footnote,
            });
        }

        if frame.attrs.url.is_some() {
            parent.image = Some(image_spec(&frame.attrs)?);
        }
    } else {
        // Document element: the map must open with a child-bearing root.
        if frame.kind != Some(NodeKind::Root) {
            return Err(ContentError::MissingRoot.into());
        }
        let id = registered_id.ok_or_else(|| {
            Error::from(ContentError::EmptyNode(
                frame.attrs.id.clone().unwrap_or_else(|| "root".to_string()),
            ))
        })?;
        *root = Some(id);
    }

    Ok(())
}

/// Registers an addressable element (id + element children) as a node and
/// returns its id, or `None` when the element is not addressable.
fn register_node(
    frame: &Frame,
    nodes: &mut HashMap<NodeId, ContentNode>,
) -> Result<Option<NodeId>> {
    let (Some(kind), Some(id), true) = (frame.kind, frame.attrs.id.as_ref(), frame.has_element_children)
    else {
        return Ok(None);
    };

    let id = NodeId::new(id.clone());
    if nodes.contains_key(&id) {
        return Err(ContentError::DuplicateId(id.to_string()).into());
    }

    nodes.insert(
        id.clone(),
        ContentNode {
            id: id.clone(),
            kind,
            links: frame.links.clone(),
            image: frame.image.clone(),
        },
    );

    Ok(Some(id))
}

fn image_spec(attrs: &ElementAttrs) -> Result<ImageSpec> {
    let url = attrs.url.clone().unwrap_or_default();
    let native_width = dimension(attrs.width.as_deref(), "width", &url)?;
    let native_height = dimension(attrs.height.as_deref(), "height", &url)?;

    Ok(ImageSpec {
        url,
        native_width,
        native_height,
        zoomable: attrs.zoomable,
    })
}

fn dimension(value: Option<&str>, name: &str, url: &str) -> Result<u32> {
    value
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| Error::Xml(format!("image `{url}` has no usable {name}")))
}

fn flag(value: &str) -> bool {
    !matches!(value, "" | "0" | "false" | "no")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <root id="root">
            <branch id="work" label="work">
                <leaf id="work-atlas" label="atlas">
                    <image url="images/atlas.png" width="800" height="600" zoomable="true"/>
                    <note label="shipped 2016"/>
                </leaf>
                <leaf id="work-ledger" label="ledger">
                    <image url="images/ledger.png" width="640" height="480"/>
                </leaf>
            </branch>
            <branch id="about" label="about">
                <note label="   "/>
                <note label="resume" href="files/resume.pdf" download="download"/>
                <note label="source on the forge" footnote="footnote"/>
                <leaf id="about-bio" label="bio">
                    <note label="hello"/>
                </leaf>
            </branch>
        </root>
    "#;

    #[test]
    fn parses_all_addressable_nodes() {
        let tree = parse(SAMPLE).expect("sample parses");
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.root_id().as_str(), "root");
        assert!(tree.contains(&NodeId::from("work-atlas")));
        assert!(tree.contains(&NodeId::from("about-bio")));
    }

    #[test]
    fn root_links_navigate_to_branches() {
        let tree = parse(SAMPLE).expect("sample parses");
        let root = tree.get(&NodeId::from("root")).expect("root");
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.links.len(), 2);
        assert_eq!(root.links[0].label, "work");
        assert_eq!(root.links[0].target, Some(NodeId::from("work")));
    }

    #[test]
    fn leaf_carries_image_spec() {
        let tree = parse(SAMPLE).expect("sample parses");
        let leaf = tree.get(&NodeId::from("work-atlas")).expect("leaf");
        assert_eq!(leaf.kind, NodeKind::Leaf);

        let image = leaf.image.as_ref().expect("image spec");
        assert_eq!(image.url, "images/atlas.png");
        assert_eq!(image.native_width, 800);
        assert_eq!(image.native_height, 600);
        assert!(image.zoomable);
    }

    #[test]
    fn unlabeled_children_do_not_become_links() {
        let tree = parse(SAMPLE).expect("sample parses");
        let leaf = tree.get(&NodeId::from("work-atlas")).expect("leaf");
        // The image element has no label; only the note row remains.
        assert_eq!(leaf.links.len(), 1);
        assert_eq!(leaf.links[0].label, "shipped 2016");
        assert_eq!(leaf.links[0].target, None);
    }

    #[test]
    fn anchor_and_footnote_rows_keep_their_attributes() {
        let tree = parse(SAMPLE).expect("sample parses");
        let about = tree.get(&NodeId::from("about")).expect("about");

        assert!(about.links[0].is_whitespace());

        let resume = &about.links[1];
        assert_eq!(resume.href.as_deref(), Some("files/resume.pdf"));
        assert!(resume.download);

        assert!(about.links[2].footnote);
    }

    #[test]
    fn non_zoomable_image_defaults_false() {
        let tree = parse(SAMPLE).expect("sample parses");
        let leaf = tree.get(&NodeId::from("work-ledger")).expect("leaf");
        assert!(!leaf.image.as_ref().expect("image").zoomable);
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = parse(r#"<branch id="a"><note label="x"/></branch>"#);
        match result {
            Err(Error::Content(ContentError::MissingRoot)) => {}
            other => panic!("expected MissingRoot, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let xml = r#"
            <root id="root">
                <branch id="twin" label="a"><note label="x"/></branch>
                <branch id="twin" label="b"><note label="y"/></branch>
            </root>
        "#;
        match parse(xml) {
            Err(Error::Content(ContentError::DuplicateId(id))) => assert_eq!(id, "twin"),
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_dimension_is_an_xml_error() {
        let xml = r#"
            <root id="root">
                <leaf id="bad" label="bad">
                    <image url="x.png" width="wide" height="10"/>
                </leaf>
            </root>
        "#;
        match parse(xml) {
            Err(Error::Xml(message)) => assert!(message.contains("x.png")),
            other => panic!("expected Xml error, got {other:?}"),
        }
    }

    #[test]
    fn childless_labeled_element_is_a_plain_row() {
        let xml = r#"
            <root id="root">
                <branch id="only" label="only"><note label="static"/></branch>
            </root>
        "#;
        let tree = parse(xml).expect("parses");
        let branch = tree.get(&NodeId::from("only")).expect("branch");
        assert_eq!(branch.links[0].target, None);
    }
}
