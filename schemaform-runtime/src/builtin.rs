//! The core plugin: validation of built-in node kinds, the default utility
//! surface and the entity catalog.

use crate::catalog::EntityCatalog;
use crate::plugin::PluginAugment;
use crate::runtime::Runtime;
use crate::utils::CoreUtils;
use crate::validation::{
    ValidateArgs, ValidateHook, ValidationError, ValidationOptions, ValidationResult,
};
use schemaform_types::{LinkValue, Node, NodeMap, ObjectNode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const CORE_PLUGIN_NAME: &str = "core";

/// Builds the core plugin for a base node map.
pub fn core_plugin(base: &NodeMap) -> PluginAugment {
    let catalog = EntityCatalog::from_nodes(base);
    let mut augment = PluginAugment::new(CORE_PLUGIN_NAME)
        .with_utils(CoreUtils)
        .with_schema_utils(Arc::new(CoreUtils))
        .with_validate_hook(Arc::new(CoreValidator));
    for (key, value) in catalog.to_data() {
        augment = augment.with_data(key, value);
    }
    augment
}

/// Validates the built-in kinds and defers on plugin kinds.
///
/// Children are validated through [`Runtime::validate`], so a plugin kind
/// nested in an object still reaches its own plugin's hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreValidator;

impl ValidateHook for CoreValidator {
    fn validate(&self, runtime: &Runtime, args: &ValidateArgs<'_>) -> Option<ValidationResult> {
        let options = args.options.unwrap_or_else(|| runtime.validation_options());
        let path = args.path;
        let data = args.data.filter(|v| !v.is_null());
        let next = options.descend();

        let result = match args.schema {
            Node::Custom(_) => return None,
            Node::Unknown(_) => ValidationResult::valid(),

            Node::Object(object) => match args.data {
                None | Some(Value::Null) => {
                    ValidationResult::error(path, "Expected an object", args.data)
                }
                Some(value) => validate_object(runtime, path, value, object, next),
            },

            Node::Nullable(nullable) => match data {
                None => ValidationResult::valid(),
                Some(value) => runtime.validate(
                    &ValidateArgs::new(&nullable.inner_schema, path, Some(value))
                        .with_options(options),
                ),
            },

            Node::Primitive(primitive) => match data {
                None => ValidationResult::valid(),
                Some(value) if !primitive.primitive_type.accepts(value) => {
                    ValidationResult::error(
                        path,
                        format!("Expected a {} value", primitive.primitive_type.as_str()),
                        Some(value),
                    )
                }
                Some(value) => {
                    let n = value.as_f64();
                    match (n, primitive.minimum, primitive.maximum) {
                        (Some(n), Some(min), _) if n < min => ValidationResult::error(
                            path,
                            format!("Value must be at least {min}"),
                            Some(value),
                        ),
                        (Some(n), _, Some(max)) if n > max => ValidationResult::error(
                            path,
                            format!("Value must be at most {max}"),
                            Some(value),
                        ),
                        _ => ValidationResult::valid(),
                    }
                }
            },

            Node::Enum(e) => match data {
                None => ValidationResult::valid(),
                Some(Value::String(s)) if e.values.contains(s) => ValidationResult::valid(),
                Some(value) => ValidationResult::error(
                    path,
                    format!("Value must be one of: {}", e.values.join(", ")),
                    Some(value),
                ),
            },

            Node::Array(array) => match data {
                None => ValidationResult::valid(),
                Some(Value::Array(items)) => {
                    let errors = items
                        .iter()
                        .enumerate()
                        .flat_map(|(i, item)| {
                            let item_path = format!("{path}[{i}]");
                            runtime
                                .validate(
                                    &ValidateArgs::new(&array.items, &item_path, Some(item))
                                        .with_options(next),
                                )
                                .errors
                        })
                        .collect();
                    ValidationResult::from_errors(errors)
                }
                Some(value) => ValidationResult::error(path, "Expected an array", Some(value)),
            },

            Node::Map(map) => match data {
                Some(Value::Object(entries)) => {
                    let errors = entries
                        .iter()
                        .flat_map(|(key, value)| {
                            let entry_path = join_path(path, key);
                            runtime
                                .validate(
                                    &ValidateArgs::new(&map.value_schema, &entry_path, Some(value))
                                        .with_options(next),
                                )
                                .errors
                        })
                        .collect();
                    ValidationResult::from_errors(errors)
                }
                _ => ValidationResult::valid(),
            },

            Node::Tuple(tuple) => match data {
                None => ValidationResult::valid(),
                Some(Value::Array(items)) if items.len() == tuple.items.len() => {
                    let errors = tuple
                        .items
                        .iter()
                        .zip(items)
                        .enumerate()
                        .flat_map(|(i, (schema, item))| {
                            let item_path = format!("{path}[{i}]");
                            runtime
                                .validate(
                                    &ValidateArgs::new(schema, &item_path, Some(item))
                                        .with_options(next),
                                )
                                .errors
                        })
                        .collect();
                    ValidationResult::from_errors(errors)
                }
                Some(value) => ValidationResult::error(
                    path,
                    format!("Expected a tuple of {} items", tuple.items.len()),
                    Some(value),
                ),
            },

            Node::TaggedUnion(union) => match data {
                Some(value @ Value::Object(fields)) => {
                    let discriminator = union.discriminator.as_deref().unwrap_or("type");
                    let tag_path = join_path(path, discriminator);
                    match fields.get(discriminator) {
                        None | Some(Value::Null) => ValidationResult::error(
                            tag_path,
                            format!("Missing discriminator field '{discriminator}'"),
                            Some(value),
                        ),
                        Some(tag) => match tag.as_str().and_then(|t| union.variant(t)) {
                            None => ValidationResult::error(
                                tag_path,
                                format!(
                                    "Unknown variant '{}' for discriminator '{discriminator}'",
                                    display(tag)
                                ),
                                Some(tag),
                            ),
                            Some(variant) => runtime.validate(
                                &ValidateArgs::new(&variant.schema, path, Some(value))
                                    .with_options(next),
                            ),
                        },
                    }
                }
                _ => ValidationResult::valid(),
            },

            Node::UntaggedEnum(untagged) => match data {
                Some(Value::String(tag)) => match untagged.variant(tag) {
                    Some(_) => ValidationResult::valid(),
                    None => unknown_variant(path, tag, args.data),
                },
                Some(value @ Value::Object(fields)) if !fields.is_empty() => {
                    if fields.len() > 1 {
                        ValidationResult::error(
                            path,
                            "Untagged enum must have exactly one variant",
                            Some(value),
                        )
                    } else {
                        let (tag, variant_data) = fields.iter().next()?;
                        match untagged.variant(tag) {
                            None => unknown_variant(path, tag, Some(value)),
                            Some(variant) => {
                                let variant_path = join_path(path, tag);
                                runtime.validate(
                                    &ValidateArgs::new(
                                        &variant.schema,
                                        &variant_path,
                                        Some(variant_data),
                                    )
                                    .with_options(next),
                                )
                            }
                        }
                    }
                }
                _ => ValidationResult::valid(),
            },

            Node::Union(union) => match data {
                None => ValidationResult::valid(),
                Some(_) if union.variants.is_empty() => ValidationResult::valid(),
                Some(value) => {
                    let matched = union.variants.iter().any(|variant| {
                        runtime
                            .validate(
                                &ValidateArgs::new(&variant.schema, path, Some(value))
                                    .with_options(next),
                            )
                            .valid
                    });
                    if matched {
                        ValidationResult::valid()
                    } else {
                        ValidationResult::error(path, "Value does not match any variant", Some(value))
                    }
                }
            },

            Node::RecursiveRef(reference) => match runtime.resolve_ref(&reference.ref_name) {
                Some(resolved) => runtime.validate(
                    &ValidateArgs::new(resolved, path, args.data).with_options(next),
                ),
                None => {
                    warn!(
                        path = %path,
                        ref_name = %reference.ref_name,
                        "Unresolved schema reference, treating as valid"
                    );
                    ValidationResult::valid()
                }
            },

            Node::Link(link) => match data {
                None => ValidationResult::valid(),
                Some(value) => match LinkValue::parse(value, &link.target_type) {
                    Ok(LinkValue::Ref { .. }) => ValidationResult::valid(),
                    Ok(LinkValue::Inline { inline, .. }) => {
                        let inline = Value::Object(inline);
                        validate_object(runtime, path, &inline, &link.inline_schema, next)
                    }
                    Err(e) => ValidationResult::error(path, e.to_string(), Some(value)),
                },
            },
        };

        Some(result)
    }
}

/// Validates `data` as an object: declared properties with field semantics,
/// then merged sub-schemas, then dynamic keys against
/// `additionalProperties`.
pub fn validate_object(
    runtime: &Runtime,
    path: &str,
    data: &Value,
    object: &ObjectNode,
    options: ValidationOptions,
) -> ValidationResult {
    if options.debug {
        debug!(path = %path, "Validating object");
    }

    let Value::Object(fields) = data else {
        return ValidationResult::error(path, "Expected an object", Some(data));
    };

    let mut errors: Vec<ValidationError> = Vec::new();
    for (name, schema) in object.properties.iter() {
        let result = validate_field(
            runtime,
            path,
            name,
            fields.get(name),
            schema,
            object.is_required(name),
            options,
        );
        errors.extend(result.errors);
    }

    for merged in &object.merged {
        let result =
            runtime.validate(&ValidateArgs::new(merged, path, Some(data)).with_options(options));
        errors.extend(result.errors);
    }

    if let Some(additional) = &object.additional_properties {
        let merged_keys = runtime.merged_keys(object);
        for (key, value) in fields {
            if object.properties.contains(key) || merged_keys.contains(key) {
                continue;
            }
            let key_path = join_path(path, key);
            let result = runtime
                .validate(&ValidateArgs::new(additional, &key_path, Some(value)).with_options(options));
            errors.extend(result.errors);
        }
    }

    ValidationResult::from_errors(errors)
}

/// Validates one property of an object.
///
/// A required primitive is missing when null, absent or the empty string.
/// Any other required field is missing when null, absent or an empty object;
/// an empty array satisfies a required array. Absent optional fields are
/// valid.
pub fn validate_field(
    runtime: &Runtime,
    parent_path: &str,
    name: &str,
    value: Option<&Value>,
    schema: &Node,
    required: bool,
    options: ValidationOptions,
) -> ValidationResult {
    let field_path = join_path(parent_path, name);
    let missing = value.is_none_or(Value::is_null);

    if required {
        let blank = match value {
            Some(Value::String(s)) => matches!(schema, Node::Primitive(_)) && s.is_empty(),
            Some(Value::Object(map)) => map.is_empty(),
            _ => false,
        };
        if missing || blank {
            return ValidationResult::error(
                &field_path,
                format!("Field '{name}' is required"),
                value,
            );
        }
    } else if missing {
        return ValidationResult::valid();
    }

    runtime.validate(&ValidateArgs::new(schema, &field_path, value).with_options(options))
}

fn unknown_variant(path: &str, tag: &str, value: Option<&Value>) -> ValidationResult {
    ValidationResult::error(
        path,
        format!("Unknown variant '{tag}' in untagged enum"),
        value,
    )
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
