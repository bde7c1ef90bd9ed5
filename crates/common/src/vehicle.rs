// =============================================================================
// Somoco Common - Catalog Documents
// =============================================================================
// Table of Contents:
// 1. Specification Sections
// 2. Parameters & Specifications
// 3. Asset References
// 4. Vehicle
// 5. Vehicle Draft (create/update body)
// 6. Partner
// 7. Lenient Field Readers
// =============================================================================
//
// The CMS owns the document shape. Everything read back from it goes through
// `from_document`, which tolerates missing, null and wrongly typed fields
// instead of trusting the stored shape.

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentError, ValidationError};

/// CMS document type name for vehicles.
pub const VEHICLE_TYPE: &str = "event";

/// CMS document type name for finance partners.
pub const PARTNER_TYPE: &str = "partner";

// -----------------------------------------------------------------------------
// 1. Specification Sections
// -----------------------------------------------------------------------------

/// One of the six fixed specification groups, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecSection {
    KeyParameters,
    BodyParameters,
    EngineParameters,
    MotorParameters,
    WheelBrakeParameters,
    KeyConfigurations,
}

impl SpecSection {
    pub const ALL: [SpecSection; 6] = [
        SpecSection::KeyParameters,
        SpecSection::BodyParameters,
        SpecSection::EngineParameters,
        SpecSection::MotorParameters,
        SpecSection::WheelBrakeParameters,
        SpecSection::KeyConfigurations,
    ];

    /// Heading shown on the product and compare pages.
    pub fn title(self) -> &'static str {
        match self {
            SpecSection::KeyParameters => "Key Parameters",
            SpecSection::BodyParameters => "Body Parameters",
            SpecSection::EngineParameters => "Engine Parameters",
            SpecSection::MotorParameters => "Motor Parameters",
            SpecSection::WheelBrakeParameters => "Wheel & Brake Parameters",
            SpecSection::KeyConfigurations => "Key Configurations",
        }
    }

    /// Field name inside the CMS `specifications` object.
    pub fn field(self) -> &'static str {
        match self {
            SpecSection::KeyParameters => "keyParameters",
            SpecSection::BodyParameters => "bodyParameters",
            SpecSection::EngineParameters => "engineParameters",
            SpecSection::MotorParameters => "motorParameters",
            SpecSection::WheelBrakeParameters => "wheelBrakeParameters",
            SpecSection::KeyConfigurations => "keyConfigurations",
        }
    }
}

// -----------------------------------------------------------------------------
// 2. Parameters & Specifications
// -----------------------------------------------------------------------------

/// A single `{name, value}` row, e.g. `Range` / `321 Km`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: None,
            name: name.into(),
            value: value.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            key: str_field(obj, "_key"),
            name: str_field(obj, "name").unwrap_or_default(),
            value: str_field(obj, "value").unwrap_or_default(),
        })
    }
}

/// The six parameter lists of a vehicle. Names are not unique and do not have
/// to match between vehicles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Specifications {
    pub key_parameters: Vec<Parameter>,
    pub body_parameters: Vec<Parameter>,
    pub engine_parameters: Vec<Parameter>,
    pub motor_parameters: Vec<Parameter>,
    pub wheel_brake_parameters: Vec<Parameter>,
    pub key_configurations: Vec<Parameter>,
}

impl Specifications {
    pub fn section(&self, section: SpecSection) -> &[Parameter] {
        match section {
            SpecSection::KeyParameters => &self.key_parameters,
            SpecSection::BodyParameters => &self.body_parameters,
            SpecSection::EngineParameters => &self.engine_parameters,
            SpecSection::MotorParameters => &self.motor_parameters,
            SpecSection::WheelBrakeParameters => &self.wheel_brake_parameters,
            SpecSection::KeyConfigurations => &self.key_configurations,
        }
    }

    pub fn section_mut(&mut self, section: SpecSection) -> &mut Vec<Parameter> {
        match section {
            SpecSection::KeyParameters => &mut self.key_parameters,
            SpecSection::BodyParameters => &mut self.body_parameters,
            SpecSection::EngineParameters => &mut self.engine_parameters,
            SpecSection::MotorParameters => &mut self.motor_parameters,
            SpecSection::WheelBrakeParameters => &mut self.wheel_brake_parameters,
            SpecSection::KeyConfigurations => &mut self.key_configurations,
        }
    }

    pub fn is_empty(&self) -> bool {
        SpecSection::ALL
            .iter()
            .all(|section| self.section(*section).is_empty())
    }

    /// Give every parameter without a `_key` a fresh one. The studio refuses to
    /// edit array items that lack keys. Returns `true` if anything changed.
    pub fn ensure_keys(&mut self) -> bool {
        let mut changed = false;
        for section in SpecSection::ALL {
            for param in self.section_mut(section) {
                if param.key.as_deref().map_or(true, str::is_empty) {
                    param.key = Some(generate_key());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Lenient read of a CMS `specifications` value. Anything that is not an
    /// object yields empty lists; non-object list items are skipped.
    pub fn from_value(value: Option<&Value>) -> Self {
        let mut specs = Self::default();
        let Some(obj) = value.and_then(Value::as_object) else {
            return specs;
        };
        for section in SpecSection::ALL {
            if let Some(items) = obj.get(section.field()).and_then(Value::as_array) {
                *specs.section_mut(section) = items.iter().filter_map(Parameter::from_value).collect();
            }
        }
        specs
    }
}

/// Random `_key` for CMS array items.
pub fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

// -----------------------------------------------------------------------------
// 3. Asset References
// -----------------------------------------------------------------------------

/// `{_type: "reference", _ref: "image-…"}` pointing at a CMS asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    #[serde(rename = "_type", default = "reference_type")]
    pub kind: String,
    #[serde(rename = "_ref")]
    pub reference: String,
}

impl AssetReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            kind: reference_type(),
            reference: reference.into(),
        }
    }
}

fn reference_type() -> String {
    "reference".into()
}

fn image_type() -> String {
    "image".into()
}

fn file_type() -> String {
    "file".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "_type", default = "image_type")]
    pub kind: String,
    pub asset: AssetReference,
}

impl ImageRef {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            key: None,
            kind: image_type(),
            asset: AssetReference::new(asset_id),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let reference = obj
            .get("asset")
            .and_then(Value::as_object)
            .and_then(|asset| str_field(asset, "_ref"))?;
        Some(Self {
            key: str_field(obj, "_key"),
            kind: image_type(),
            asset: AssetReference::new(reference),
        })
    }
}

/// A downloadable file such as the PDF spec sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(rename = "_type", default = "file_type")]
    pub kind: String,
    pub asset: AssetReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FileRef {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            kind: file_type(),
            asset: AssetReference::new(asset_id),
            title: None,
            description: None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let reference = obj
            .get("asset")
            .and_then(Value::as_object)
            .and_then(|asset| str_field(asset, "_ref"))?;
        Some(Self {
            kind: file_type(),
            asset: AssetReference::new(reference),
            title: str_field(obj, "title"),
            description: str_field(obj, "description"),
        })
    }
}

// -----------------------------------------------------------------------------
// 4. Vehicle
// -----------------------------------------------------------------------------

/// A vehicle as served by the API. Field names follow the CMS document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub brand: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exterior_images: Vec<ImageRef>,
    #[serde(default)]
    pub interior_images: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<i64>,
}

impl Vehicle {
    /// Decode a raw CMS document. Only `_id` is mandatory; every other field
    /// falls back to its empty value.
    pub fn from_document(doc: &Value) -> Result<Self, DocumentError> {
        let obj = doc.as_object().ok_or(DocumentError::NotAnObject)?;
        let id = str_field(obj, "_id").ok_or(DocumentError::MissingField("_id"))?;

        Ok(Self {
            id,
            created_at: str_field(obj, "_createdAt")
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            brand: str_field(obj, "brand").unwrap_or_default(),
            name: str_field(obj, "name").unwrap_or_default(),
            vehicle_type: str_field(obj, "type").unwrap_or_default(),
            description: str_field(obj, "description").unwrap_or_default(),
            exterior_images: image_list(obj.get("exteriorImages")),
            interior_images: image_list(obj.get("interiorImages")),
            document: obj.get("document").and_then(FileRef::from_value),
            specifications: Specifications::from_value(obj.get("specifications")),
            disabled: obj.get("disabled").and_then(Value::as_bool).unwrap_or(false),
            ranking: obj.get("ranking").and_then(Value::as_i64),
        })
    }

    /// "Brand Name", as used in headings and select lists.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.name).trim().to_string()
    }

    /// Gallery order: exterior shots first, then interior, each in upload order.
    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.exterior_images.iter().chain(self.interior_images.iter())
    }
}

fn image_list(value: Option<&Value>) -> Vec<ImageRef> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(ImageRef::from_value).collect())
        .unwrap_or_default()
}

/// Array fields of a vehicle document whose items carry `_key`.
const IMAGE_FIELDS: [&str; 2] = ["exteriorImages", "interiorImages"];

/// `set` patch giving every keyless array item of a stored vehicle document a
/// `_key`, or `None` when every item already has one. Works on the raw
/// document so fields this crate does not model survive the rewrite.
pub fn missing_keys_patch(doc: &Value) -> Option<Map<String, Value>> {
    let mut fields = Map::new();

    if let Some(Value::Object(specs)) = doc.get("specifications") {
        let mut specs = specs.clone();
        let mut changed = false;
        for section in SpecSection::ALL {
            if let Some(Value::Array(items)) = specs.get_mut(section.field()) {
                changed |= fill_missing_keys(items);
            }
        }
        if changed {
            fields.insert("specifications".into(), Value::Object(specs));
        }
    }

    for field in IMAGE_FIELDS {
        if let Some(Value::Array(items)) = doc.get(field) {
            let mut items = items.clone();
            if fill_missing_keys(&mut items) {
                fields.insert(field.into(), Value::Array(items));
            }
        }
    }

    (!fields.is_empty()).then_some(fields)
}

fn fill_missing_keys(items: &mut [Value]) -> bool {
    let mut changed = false;
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        if item.get("_key").and_then(Value::as_str).map_or(true, str::is_empty) {
            item.insert("_key".into(), Value::String(generate_key()));
            changed = true;
        }
    }
    changed
}

// -----------------------------------------------------------------------------
// 5. Vehicle Draft
// -----------------------------------------------------------------------------

/// Body of `POST /api/vehicles` and `PUT /api/vehicles/:id`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exterior_images: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub interior_images: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub specifications: Option<Specifications>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

impl VehicleDraft {
    pub fn new(brand: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            brand: Some(brand.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// `brand` and `name` must both be present and non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if is_blank(self.brand.as_deref()) {
            fields.push("brand");
        }
        if is_blank(self.name.as_deref()) {
            fields.push("name");
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingRequired { fields })
        }
    }

    /// Field set written to the CMS. Omitted optional fields get their empty
    /// defaults, so an update always rewrites the full editable surface.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut specifications = self.specifications.unwrap_or_default();
        specifications.ensure_keys();

        let mut exterior = self.exterior_images.unwrap_or_default();
        let mut interior = self.interior_images.unwrap_or_default();
        for image in exterior.iter_mut().chain(interior.iter_mut()) {
            if image.key.is_none() {
                image.key = Some(generate_key());
            }
        }

        let mut fields = Map::new();
        fields.insert("brand".into(), Value::String(self.brand.unwrap_or_default()));
        fields.insert("name".into(), Value::String(self.name.unwrap_or_default()));
        fields.insert("type".into(), Value::String(self.vehicle_type.unwrap_or_default()));
        fields.insert(
            "description".into(),
            Value::String(self.description.unwrap_or_default()),
        );
        fields.insert("exteriorImages".into(), to_value(&exterior));
        fields.insert("interiorImages".into(), to_value(&interior));
        fields.insert("specifications".into(), to_value(&specifications));
        if let Some(document) = self.document {
            fields.insert("document".into(), to_value(&document));
        }
        if let Some(disabled) = self.disabled {
            fields.insert("disabled".into(), Value::Bool(disabled));
        }
        fields
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn to_value<T: Serialize>(value: &T) -> Value {
    // Plain derived structs of strings and vectors cannot fail to serialize.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

// -----------------------------------------------------------------------------
// 6. Partner
// -----------------------------------------------------------------------------

/// Asset-finance partner shown in the finance inquiry flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl Partner {
    pub fn from_document(doc: &Value) -> Result<Self, DocumentError> {
        let obj = doc.as_object().ok_or(DocumentError::NotAnObject)?;
        Ok(Self {
            id: str_field(obj, "_id").ok_or(DocumentError::MissingField("_id"))?,
            name: str_field(obj, "name").ok_or(DocumentError::MissingField("name"))?,
            logo: obj.get("logo").and_then(ImageRef::from_value),
            email: str_field(obj, "email").filter(|e| !e.trim().is_empty()),
            disabled: obj.get("disabled").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

// -----------------------------------------------------------------------------
// 7. Lenient Field Readers
// -----------------------------------------------------------------------------

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
