//! Renderers for the built-in node kinds.
//!
//! Compound renderers recurse through [`RenderContext::dispatch`], so plugin
//! kinds nested inside core containers still reach their own renderer.

use crate::registry::Renderer;
use crate::render::{Content, RenderContext, Rendered};
use schemaform_types::{LinkValue, Node, NodeKind, ObjectNode};
use serde_json::Value;
use std::sync::Arc;

/// The core renderer for a built-in kind.
pub fn core_renderer(kind: NodeKind) -> Arc<dyn Renderer> {
    match kind {
        NodeKind::Primitive | NodeKind::Enum | NodeKind::Unknown => Arc::new(ScalarRenderer),
        NodeKind::Object => Arc::new(ObjectRenderer),
        NodeKind::Array => Arc::new(ArrayRenderer),
        NodeKind::Map => Arc::new(MapRenderer),
        NodeKind::Tuple => Arc::new(TupleRenderer),
        NodeKind::Nullable => Arc::new(NullableRenderer),
        NodeKind::TaggedUnion => Arc::new(TaggedUnionRenderer),
        NodeKind::Union => Arc::new(UnionRenderer),
        NodeKind::UntaggedEnum => Arc::new(UntaggedEnumRenderer),
        NodeKind::Link => Arc::new(LinkRenderer),
        NodeKind::RecursiveRef => Arc::new(RecursiveRefRenderer),
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn raw(ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
    match present(value) {
        Some(value) => ctx.leaf(node, Content::value(value.clone())),
        None => ctx.leaf(node, Content::Empty),
    }
}

fn children(ctx: &RenderContext<'_>, node: &Node, children: Vec<Rendered>) -> Rendered {
    ctx.leaf(node, Content::Children { children })
}

struct ScalarRenderer;

impl Renderer for ScalarRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        raw(ctx, node, value)
    }
}

struct ObjectRenderer;

impl Renderer for ObjectRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        match node {
            Node::Object(object) => render_object(ctx, node, object, present(value)),
            _ => raw(ctx, node, value),
        }
    }
}

/// Direct properties in display order, then merged sub-schemas, then
/// dynamic keys.
fn render_object(
    ctx: &RenderContext<'_>,
    node: &Node,
    object: &ObjectNode,
    value: Option<&Value>,
) -> Rendered {
    let runtime = ctx.runtime();
    let utils = runtime.utils();
    let fields = utils.sort_entity_properties(object.properties.iter().collect(), value, &object.required);

    let mut rendered = Vec::new();
    for (name, property) in fields {
        let field = ctx
            .child(name)
            .dispatch(property, value.and_then(|v| v.get(name)));
        rendered.push(field.with_label(utils.generate_field_label(name)));
    }

    for merged in &object.merged {
        rendered.push(ctx.nested().dispatch(merged, value));
    }

    if let (Some(additional), Some(Value::Object(entries))) = (&object.additional_properties, value) {
        let merged_keys = runtime.merged_keys(object);
        for (key, entry) in entries {
            if object.properties.contains(key) || merged_keys.contains(key) {
                continue;
            }
            rendered.push(ctx.child(key).dispatch(additional, Some(entry)).with_label(key.clone()));
        }
    }

    children(ctx, node, rendered)
}

struct ArrayRenderer;

impl Renderer for ArrayRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        match (node, present(value)) {
            (Node::Array(array), Some(Value::Array(items))) => {
                let rendered = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| ctx.item(i).dispatch(&array.items, Some(item)))
                    .collect();
                children(ctx, node, rendered)
            }
            _ => raw(ctx, node, value),
        }
    }
}

struct MapRenderer;

impl Renderer for MapRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        match (node, present(value)) {
            (Node::Map(map), Some(Value::Object(entries))) => {
                let rendered = entries
                    .iter()
                    .map(|(key, entry)| {
                        ctx.child(key)
                            .dispatch(&map.value_schema, Some(entry))
                            .with_label(key.clone())
                    })
                    .collect();
                children(ctx, node, rendered)
            }
            _ => raw(ctx, node, value),
        }
    }
}

struct TupleRenderer;

impl Renderer for TupleRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        match (node, present(value)) {
            (Node::Tuple(tuple), Some(Value::Array(items))) => {
                let rendered = tuple
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, schema)| ctx.item(i).dispatch(schema, items.get(i)))
                    .collect();
                children(ctx, node, rendered)
            }
            _ => raw(ctx, node, value),
        }
    }
}

struct NullableRenderer;

impl Renderer for NullableRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        match (node, present(value)) {
            (Node::Nullable(nullable), Some(inner)) => {
                let rendered = ctx.nested().dispatch(&nullable.inner_schema, Some(inner));
                children(ctx, node, vec![rendered])
            }
            _ => ctx.leaf(node, Content::Empty),
        }
    }
}

struct TaggedUnionRenderer;

impl Renderer for TaggedUnionRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        let (Node::TaggedUnion(union), Some(data)) = (node, present(value)) else {
            return raw(ctx, node, value);
        };
        let discriminator = union.discriminator.as_deref().unwrap_or("type");
        let variant = data
            .get(discriminator)
            .and_then(Value::as_str)
            .and_then(|tag| union.variant(tag));

        match variant {
            Some(variant) => {
                let rendered = ctx
                    .nested()
                    .dispatch(&variant.schema, Some(data))
                    .with_label(variant.tag.clone());
                children(ctx, node, vec![rendered])
            }
            None => raw(ctx, node, value),
        }
    }
}

struct UnionRenderer;

impl Renderer for UnionRenderer {
    /// Draws the first variant the value validates against.
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        let (Node::Union(union), Some(data)) = (node, present(value)) else {
            return raw(ctx, node, value);
        };
        let matched = union.variants.iter().find(|variant| {
            ctx.runtime()
                .validate_value(&variant.schema, ctx.path(), Some(data))
                .valid
        });

        match matched {
            Some(variant) => {
                let rendered = ctx
                    .nested()
                    .dispatch(&variant.schema, Some(data))
                    .with_label(variant.tag.clone());
                children(ctx, node, vec![rendered])
            }
            None => raw(ctx, node, value),
        }
    }
}

struct UntaggedEnumRenderer;

impl Renderer for UntaggedEnumRenderer {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        let (Node::UntaggedEnum(untagged), Some(Value::Object(fields))) = (node, present(value)) else {
            return raw(ctx, node, value);
        };
        let mut entries = fields.iter();
        let (Some((tag, data)), None) = (entries.next(), entries.next()) else {
            return raw(ctx, node, value);
        };

        match untagged.variant(tag) {
            Some(variant) => {
                let rendered = ctx
                    .child(tag)
                    .dispatch(&variant.schema, Some(data))
                    .with_label(tag.clone());
                children(ctx, node, vec![rendered])
            }
            None => raw(ctx, node, value),
        }
    }
}

struct LinkRenderer;

impl Renderer for LinkRenderer {
    /// References render as the raw link; inline entities render through
    /// the link's inline schema.
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        let (Node::Link(link), Some(data)) = (node, present(value)) else {
            return raw(ctx, node, value);
        };

        match LinkValue::parse(data, &link.target_type) {
            Ok(LinkValue::Inline { entity_type, inline }) => {
                let inline = Value::Object(inline);
                let schema = Node::Object(link.inline_schema.clone());
                let rendered = render_object(&ctx.child("inline"), &schema, &link.inline_schema, Some(&inline))
                    .with_label(entity_type);
                children(ctx, node, vec![rendered])
            }
            Ok(reference) => match reference.to_value() {
                Ok(value) => ctx.leaf(node, Content::value(value)),
                Err(_) => raw(ctx, node, Some(data)),
            },
            Err(_) => raw(ctx, node, Some(data)),
        }
    }
}

struct RecursiveRefRenderer;

impl Renderer for RecursiveRefRenderer {
    /// Resolved late against the runtime's node map. A null or absent value
    /// renders empty without resolving, which bounds recursion by the value.
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        let Node::RecursiveRef(reference) = node else {
            return raw(ctx, node, value);
        };
        let Some(data) = present(value) else {
            return ctx.leaf(node, Content::Empty);
        };

        match ctx.resolve_ref(&reference.ref_name) {
            Some(resolved) => ctx.nested().dispatch(resolved, Some(data)),
            None => ctx.leaf(
                node,
                Content::UnknownReference {
                    ref_name: reference.ref_name.clone(),
                },
            ),
        }
    }
}
