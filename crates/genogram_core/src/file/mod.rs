//! Genogram document format.
//!
//! # Responsibility
//! - Dump graph collections plus metadata as a versioned JSON document.
//! - Load hand-edited or corrupted documents without failing: coerce every
//!   field, then repair referential invariants.
//!
//! # Invariants
//! - Only non-JSON or non-object input is an error.
//! - `from_file(to_file(s))` yields a snapshot equal to `s`.
//! - Unknown metadata keys survive a load/save cycle.
//!
//! # See also
//! - crate::store::repair for the referential pass.

mod coerce;

use crate::model::annotation::TextBox;
use crate::model::geometry::Point;
use crate::model::household::{Household, DEFAULT_HOUSEHOLD_COLOR};
use crate::model::ids::{HouseholdId, PersonId, RelationshipId, TextBoxId};
use crate::model::person::{Gender, MemberStatus, NodeKind, Person, SpecialStatus};
use crate::model::relationship::{
    clamp_bubble_position, LineStyle, Relationship, RelationshipLink, RelationshipType,
    DEFAULT_BUBBLE_POSITION, DEFAULT_RELATIONSHIP_COLOR,
};
use crate::store::{repair, GraphSnapshot};
use chrono::{DateTime, SecondsFormat, Utc};
use coerce::Fields;
use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version tag written into every document.
pub const FORMAT_VERSION: &str = "2.0";

pub type FileResult<T> = Result<T, FileError>;

#[derive(Debug)]
pub enum FileError {
    /// Input is not valid JSON.
    NotJson(serde_json::Error),
    /// Input is JSON but not an object.
    NotObject,
    /// Document could not be encoded.
    Encode(serde_json::Error),
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotJson(err) => write!(f, "genogram file is not valid JSON: {err}"),
            Self::NotObject => write!(f, "genogram file must be a JSON object"),
            Self::Encode(err) => write!(f, "failed to encode genogram file: {err}"),
        }
    }
}

impl Error for FileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotJson(err) | Self::Encode(err) => Some(err),
            Self::NotObject => None,
        }
    }
}

/// Case metadata stored next to the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenogramMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caseworker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Keys written by other tools, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenogramMetadata {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        let fields = Fields::new(map);
        let known = ["title", "caseId", "caseworker", "createdAt", "notes"];
        Self {
            title: fields.opt_string("title"),
            case_id: fields.opt_string("caseId"),
            caseworker: fields.opt_string("caseworker"),
            created_at: fields.opt_string("createdAt"),
            notes: fields.opt_string("notes"),
            extra: map
                .iter()
                .filter(|(key, _)| !known.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Wire document as written by `to_file`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenogramDocument {
    pub version: String,
    pub saved_at: String,
    pub metadata: GenogramMetadata,
    pub people: Vec<Value>,
    pub relationships: Vec<Value>,
    pub households: Vec<Value>,
    pub text_boxes: Vec<Value>,
}

/// What a lenient load had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records skipped or fields replaced during coercion.
    pub coerced: Vec<String>,
    /// Records dropped or fixed by the referential pass.
    pub repaired: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.coerced.is_empty() && self.repaired.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGenogram {
    pub snapshot: GraphSnapshot,
    pub metadata: GenogramMetadata,
    /// `version` as found in the input, if any.
    pub version: Option<String>,
    pub saved_at: Option<String>,
    pub report: LoadReport,
}

pub fn to_document(snapshot: &GraphSnapshot, metadata: &GenogramMetadata) -> GenogramDocument {
    to_document_at(snapshot, metadata, Utc::now())
}

/// Like [`to_document`] with an explicit save timestamp.
pub fn to_document_at(
    snapshot: &GraphSnapshot,
    metadata: &GenogramMetadata,
    saved_at: DateTime<Utc>,
) -> GenogramDocument {
    GenogramDocument {
        version: FORMAT_VERSION.to_string(),
        saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        metadata: metadata.clone(),
        people: snapshot.people.iter().map(person_to_value).collect(),
        relationships: snapshot.relationships.iter().map(relationship_to_value).collect(),
        households: snapshot.households.iter().map(household_to_value).collect(),
        text_boxes: snapshot.text_boxes.iter().map(text_box_to_value).collect(),
    }
}

/// Pretty-printed JSON document.
pub fn to_file(snapshot: &GraphSnapshot, metadata: &GenogramMetadata) -> FileResult<String> {
    let document = to_document(snapshot, metadata);
    let raw = serde_json::to_string_pretty(&document).map_err(FileError::Encode)?;
    info!(
        "event=file_encode module=file status=ok people={} relationships={} bytes={}",
        document.people.len(),
        document.relationships.len(),
        raw.len()
    );
    Ok(raw)
}

/// Parses and sanitizes a document.
pub fn from_file(raw: &str) -> FileResult<LoadedGenogram> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        warn!("event=file_decode module=file status=error reason=not_json");
        FileError::NotJson(err)
    })?;
    from_value(&value)
}

/// Sanitizes an already parsed document (embedding `LOAD_GENOGRAM`).
pub fn from_value(value: &Value) -> FileResult<LoadedGenogram> {
    let Some(root) = value.as_object() else {
        warn!("event=file_decode module=file status=error reason=not_object");
        return Err(FileError::NotObject);
    };
    let fields = Fields::new(root);
    let mut report = LoadReport::default();

    let people = collect_records(fields.array("people"), "people", &mut report, person_from_map);
    let relationships = collect_records(
        fields.array("relationships"),
        "relationships",
        &mut report,
        relationship_from_map,
    );
    let households = collect_records(
        fields.array("households"),
        "households",
        &mut report,
        household_from_map,
    );
    let text_boxes = collect_records(
        fields.array("textBoxes"),
        "textBoxes",
        &mut report,
        text_box_from_map,
    );

    let (snapshot, repaired) = repair(GraphSnapshot::new(
        people,
        relationships,
        households,
        text_boxes,
    ));
    report.repaired = repaired;

    let version = fields.opt_string("version");
    if let Some(found) = &version {
        if major_version(found) > major_version(FORMAT_VERSION) {
            report
                .coerced
                .push(format!("document version {found} is newer than {FORMAT_VERSION}"));
        }
    }

    let status = if report.is_clean() { "ok" } else { "repaired" };
    info!(
        "event=file_decode module=file status={status} people={} relationships={} coerced={} repaired={}",
        snapshot.people.len(),
        snapshot.relationships.len(),
        report.coerced.len(),
        report.repaired.len()
    );
    Ok(LoadedGenogram {
        snapshot,
        metadata: GenogramMetadata::from_value(fields.raw("metadata")),
        version,
        saved_at: fields.opt_string("savedAt"),
        report,
    })
}

fn major_version(version: &str) -> u32 {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .unwrap_or(0)
}

fn collect_records<T>(
    items: &[Value],
    collection: &str,
    report: &mut LoadReport,
    parse: impl Fn(&Fields<'_>, &mut Vec<String>) -> T,
) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item.as_object() {
            Some(map) => {
                let mut notes = Vec::new();
                let record = parse(&Fields::new(map), &mut notes);
                report
                    .coerced
                    .extend(notes.into_iter().map(|note| format!("{collection}[{index}]: {note}")));
                Some(record)
            }
            None => {
                report
                    .coerced
                    .push(format!("{collection}[{index}]: not an object, skipped"));
                None
            }
        })
        .collect()
}

fn record_id(fields: &Fields<'_>, notes: &mut Vec<String>) -> Option<String> {
    let id = fields.id("id");
    if id.is_none() {
        notes.push("missing id, generated a new one".to_string());
    }
    id
}

// ----- people --------------------------------------------------------------

fn person_from_map(fields: &Fields<'_>, notes: &mut Vec<String>) -> Person {
    let id = record_id(fields, notes)
        .map(PersonId::from)
        .unwrap_or_else(PersonId::generate);
    let mut person = Person::with_id(id, fields.string("name"));
    person.gender = Gender::parse(&fields.string("gender"));
    person.age = fields.opt_u32("age");
    person.birth_date = fields.opt_string("birthDate");
    person.death_date = fields.opt_string("deathDate");
    person.is_deceased = fields.bool_or("isDeceased", false);
    person.deceased_symbol = fields.opt_string("deceasedSymbol");
    person.is_pregnant = fields.bool_or("isPregnant", false);
    person.pregnancy_weeks = fields.opt_u32("pregnancyWeeks");
    person.generation = fields.i32_or("generation", 0);
    person.x = fields.f64_or("x", 0.0);
    person.y = fields.f64_or("y", 0.0);
    person.network_member = fields.bool_or("networkMember", false);
    person.notes = fields.string("notes");
    person.special_status = SpecialStatus::parse(&fields.string("specialStatus"));
    person.kind = node_kind_from(fields, notes);
    person.phones = fields.strings("phones");
    person.emails = fields.strings("emails");
    person.sources = fields.strings("sources");
    person.status = MemberStatus::parse(&fields.string("status"));
    person.merged_into = fields.id("mergedInto").map(PersonId::from);
    person
}

fn node_kind_from(fields: &Fields<'_>, notes: &mut Vec<String>) -> NodeKind {
    let empty = Map::new();
    let data = Fields::new(fields.object("typeData").unwrap_or(&empty));
    let tag = fields.string("type");
    match tag.trim() {
        "" | "person" => NodeKind::Person,
        "organization" => NodeKind::Organization {
            org_type: data.string("orgType"),
            contact_person: data.string("contactPerson"),
        },
        "service" | "resource" => NodeKind::Service {
            service_type: data.string("serviceType"),
            provider: data.string("provider"),
        },
        "place" => NodeKind::Place {
            address: data.string("address"),
        },
        "custom" => {
            let mut payload = fields.object("typeData").cloned().unwrap_or_default();
            let label = payload
                .remove("label")
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_default();
            NodeKind::Custom {
                label,
                fields: payload,
            }
        }
        other => {
            notes.push(format!("unknown node type `{other}`, loaded as person"));
            NodeKind::Person
        }
    }
}

fn node_kind_to_value(kind: &NodeKind) -> Value {
    match kind {
        NodeKind::Person => Value::Null,
        NodeKind::Organization {
            org_type,
            contact_person,
        } => json!({ "orgType": org_type, "contactPerson": contact_person }),
        NodeKind::Service {
            service_type,
            provider,
        } => json!({ "serviceType": service_type, "provider": provider }),
        NodeKind::Place { address } => json!({ "address": address }),
        NodeKind::Custom { label, fields } => {
            let mut payload = fields.clone();
            payload.insert("label".to_string(), Value::String(label.clone()));
            Value::Object(payload)
        }
    }
}

fn person_to_value(person: &Person) -> Value {
    json!({
        "id": person.id,
        "name": person.name,
        "gender": person.gender.as_str(),
        "age": person.age,
        "birthDate": person.birth_date,
        "deathDate": person.death_date,
        "isDeceased": person.is_deceased,
        "deceasedSymbol": person.deceased_symbol,
        "isPregnant": person.is_pregnant,
        "pregnancyWeeks": person.pregnancy_weeks,
        "generation": person.generation,
        "x": person.x,
        "y": person.y,
        "networkMember": person.network_member,
        "notes": person.notes,
        "specialStatus": person.special_status.as_str(),
        "type": person.kind.tag(),
        "typeData": node_kind_to_value(&person.kind),
        "phones": person.phones,
        "emails": person.emails,
        "sources": person.sources,
        "status": person.status.as_str(),
        "mergedInto": person.merged_into,
    })
}

// ----- relationships -------------------------------------------------------

fn relationship_from_map(fields: &Fields<'_>, notes: &mut Vec<String>) -> Relationship {
    let id = record_id(fields, notes)
        .map(RelationshipId::from)
        .unwrap_or_else(RelationshipId::generate);
    let kind = match fields.id("type") {
        Some(tag) => RelationshipType::parse(&tag),
        None => {
            notes.push("missing type, loaded as partner".to_string());
            RelationshipType::Partner
        }
    };
    let from = fields.id("from").unwrap_or_default();
    let to = fields.id("to").unwrap_or_default();

    // Shape follows the wire convention; invalid shapes are dropped by repair.
    let link = if kind == RelationshipType::Child {
        RelationshipLink::Child {
            union: RelationshipId::from(from),
            child: PersonId::from(to),
        }
    } else if from == to && kind == RelationshipType::Adoption {
        RelationshipLink::SingleParent {
            parent: PersonId::from(from),
        }
    } else {
        RelationshipLink::Union {
            from: PersonId::from(from),
            to: PersonId::from(to),
        }
    };

    let bubble_raw = fields.f64_or("bubblePosition", DEFAULT_BUBBLE_POSITION);
    let bubble_position = clamp_bubble_position(bubble_raw);
    if bubble_position != bubble_raw {
        notes.push("bubblePosition clamped to [0, 1]".to_string());
    }

    Relationship {
        id,
        link,
        kind,
        color: fields
            .id("color")
            .unwrap_or_else(|| DEFAULT_RELATIONSHIP_COLOR.to_string()),
        line_style: LineStyle::parse(&fields.string("lineStyle")),
        start_date: fields.opt_string("startDate"),
        end_date: fields.opt_string("endDate"),
        is_active: fields.bool_or("isActive", true),
        bubble_position,
        notes: fields.string("notes"),
    }
}

fn relationship_to_value(rel: &Relationship) -> Value {
    let (from, to) = match &rel.link {
        RelationshipLink::Union { from, to } => (from.to_string(), to.to_string()),
        RelationshipLink::Child { union, child } => (union.to_string(), child.to_string()),
        RelationshipLink::SingleParent { parent } => (parent.to_string(), parent.to_string()),
    };
    json!({
        "id": rel.id,
        "from": from,
        "to": to,
        "type": rel.kind.as_str(),
        "color": rel.color,
        "lineStyle": rel.line_style.as_str(),
        "startDate": rel.start_date,
        "endDate": rel.end_date,
        "isActive": rel.is_active,
        "bubblePosition": rel.bubble_position,
        "notes": rel.notes,
    })
}

// ----- households and text boxes -------------------------------------------

fn household_from_map(fields: &Fields<'_>, notes: &mut Vec<String>) -> Household {
    let id = record_id(fields, notes)
        .map(HouseholdId::from)
        .unwrap_or_else(HouseholdId::generate);
    let raw_points = fields.array("points");
    let points: Vec<Point> = raw_points
        .iter()
        .filter_map(|point| {
            let map = point.as_object()?;
            let point = Fields::new(map);
            Some(Point::new(point.opt_f64("x")?, point.opt_f64("y")?))
        })
        .collect();
    if points.len() != raw_points.len() {
        notes.push(format!(
            "dropped {} malformed points",
            raw_points.len() - points.len()
        ));
    }
    Household {
        id,
        name: fields.string("name"),
        color: fields
            .id("color")
            .unwrap_or_else(|| DEFAULT_HOUSEHOLD_COLOR.to_string()),
        points,
    }
}

fn household_to_value(household: &Household) -> Value {
    json!({
        "id": household.id,
        "name": household.name,
        "color": household.color,
        "points": household.points,
    })
}

fn text_box_from_map(fields: &Fields<'_>, notes: &mut Vec<String>) -> TextBox {
    let id = record_id(fields, notes)
        .map(TextBoxId::from)
        .unwrap_or_else(TextBoxId::generate);
    TextBox {
        id,
        x: fields.f64_or("x", 0.0),
        y: fields.f64_or("y", 0.0),
        width: fields.f64_or("width", 0.0).max(0.0),
        height: fields.f64_or("height", 0.0).max(0.0),
        html: fields.string("html"),
    }
}

fn text_box_to_value(text_box: &TextBox) -> Value {
    json!({
        "id": text_box.id,
        "x": text_box.x,
        "y": text_box.y,
        "width": text_box.width,
        "height": text_box.height,
        "html": text_box.html,
    })
}
