use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ModelError;
use crate::path::DYNAMIC_ATTRIBUTE_PREFIX;

/// A runtime-attached extension field of an entity type.
///
/// Dynamic attributes are not part of the entity's static shape; their values
/// are kept in [`Entity::dynamic_attributes`](crate::Entity) under `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute code, unique per entity type.
    pub code: String,
    /// Qualified name of the owning entity type (e.g. "com.acme.sales.Order").
    pub entity_type: String,
    pub value_type: AttributeType,
    /// Grouping used by editors (e.g. "Shipping").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Display position within the entity type.
    #[serde(default)]
    pub order_no: i32,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Allowed values. Only meaningful when `value_type` is `Enumeration`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(alias = "options")]
    pub enumeration: Option<Vec<String>>,
    /// Referenced entity type. Only meaningful when `value_type` is `Entity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity: Option<String>,
}

impl AttributeDefinition {
    pub fn new(entity_type: &str, code: &str, value_type: AttributeType) -> Self {
        Self {
            code: code.into(),
            entity_type: entity_type.into(),
            value_type,
            category: None,
            order_no: 0,
            required: false,
            default_value: None,
            enumeration: None,
            target_entity: None,
        }
    }

    /// Shorthand for a string attribute.
    pub fn string(entity_type: &str, code: &str) -> Self {
        Self::new(entity_type, code, AttributeType::String)
    }

    pub fn integer(entity_type: &str, code: &str) -> Self {
        Self::new(entity_type, code, AttributeType::Integer)
    }

    pub fn double(entity_type: &str, code: &str) -> Self {
        Self::new(entity_type, code, AttributeType::Double)
    }

    pub fn boolean(entity_type: &str, code: &str) -> Self {
        Self::new(entity_type, code, AttributeType::Boolean)
    }

    pub fn date(entity_type: &str, code: &str) -> Self {
        Self::new(entity_type, code, AttributeType::Date)
    }

    /// Shorthand for an enumeration attribute with fixed options.
    pub fn enumeration(entity_type: &str, code: &str, options: Vec<String>) -> Self {
        Self {
            enumeration: Some(options),
            ..Self::new(entity_type, code, AttributeType::Enumeration)
        }
    }

    /// Shorthand for a reference to another entity type.
    pub fn entity_ref(entity_type: &str, code: &str, target: &str) -> Self {
        Self {
            target_entity: Some(target.into()),
            ..Self::new(entity_type, code, AttributeType::Entity)
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_order(mut self, order_no: i32) -> Self {
        self.order_no = order_no;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Property path addressing this attribute on an entity (`+code`).
    pub fn property_path(&self) -> String {
        format!("{DYNAMIC_ATTRIBUTE_PREFIX}{}", self.code)
    }

    /// Checks that the definition is internally consistent.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: &str| ModelError::InvalidAttribute {
            entity_type: self.entity_type.clone(),
            code: self.code.clone(),
            reason: reason.into(),
        };

        if self.code.trim().is_empty() {
            return Err(invalid("code is required"));
        }
        if self.code.contains('.') || self.code.starts_with(DYNAMIC_ATTRIBUTE_PREFIX) {
            return Err(invalid("code must not contain '.' or start with '+'"));
        }
        if self.entity_type.trim().is_empty() {
            return Err(invalid("entity_type is required"));
        }

        match self.value_type {
            AttributeType::Enumeration => {
                if self.enumeration.as_ref().is_none_or(|o| o.is_empty()) {
                    return Err(invalid("enumeration attribute has no options"));
                }
            }
            AttributeType::Entity => {
                if self.target_entity.as_ref().is_none_or(|t| t.trim().is_empty()) {
                    return Err(invalid("entity attribute has no target_entity"));
                }
            }
            _ => {
                if self.enumeration.is_some() {
                    return Err(invalid("options are only allowed on enumeration attributes"));
                }
                if self.target_entity.is_some() {
                    return Err(invalid("target_entity is only allowed on entity attributes"));
                }
            }
        }

        if let (AttributeType::Enumeration, Some(Value::String(default)), Some(options)) =
            (self.value_type, &self.default_value, &self.enumeration)
        {
            if !options.contains(default) {
                return Err(invalid("default value is not one of the options"));
            }
        }

        Ok(())
    }
}

/// The declared value type of a dynamic attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Integer,
    Double,
    Boolean,
    Date,
    Enumeration,
    Entity,
}
