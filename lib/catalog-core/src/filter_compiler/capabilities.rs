//! Static description of what each entity type supports per facility
//! hierarchy: filterable and sortable columns, searchable fields, the join
//! path used to restrict results to the current user and the sub-entities
//! every query includes.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};

use crate::model::entity::EntityType;

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Hierarchy {
    #[default]
    Generic,
    Isis,
    Dls,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeBounds {
    /// `gte` / `lte`
    Inclusive,
    /// `gt` / `lt`
    Exclusive,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Text,
    Number(RangeBounds),
    Date,
    /// one of a set of distinct values
    List,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub sortable: bool,
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Text,
        sortable: true,
    }
}

const fn date(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Date,
        sortable: true,
    }
}

const fn number(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Number(RangeBounds::Inclusive),
        sortable: true,
    }
}

const fn list(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::List,
        sortable: false,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntityCapabilities {
    pub entity_type: EntityType,
    pub hierarchy: Hierarchy,
    pub columns: Vec<ColumnSpec>,
    pub searchable: Vec<&'static str>,
    /// column compared with the principal name when results are restricted
    pub restrict_path: Option<&'static str>,
    pub include: Vec<Value>,
}

impl EntityCapabilities {
    pub fn lookup(hierarchy: Hierarchy, entity_type: EntityType) -> Self {
        let mut capabilities = generic(entity_type);
        capabilities.hierarchy = hierarchy;

        match (hierarchy, entity_type) {
            (Hierarchy::Isis | Hierarchy::Dls, EntityType::Investigation) => {
                capabilities
                    .columns
                    .push(text("investigationInstruments.instrument.fullName"));
                capabilities
                    .include
                    .push(json!({ "investigationInstruments": "instrument" }));
            }
            (Hierarchy::Isis | Hierarchy::Dls, EntityType::Dataset) => {
                capabilities.columns.push(list("type.name"));
                capabilities.include.push(json!("type"));
            }
            (Hierarchy::Isis, EntityType::Instrument) => {
                capabilities.restrict_path = Some("instrumentScientists.user.name");
            }
            _ => {}
        }

        capabilities
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        name == "id" || self.column(name).is_some_and(|column| column.sortable)
    }
}

fn generic(entity_type: EntityType) -> EntityCapabilities {
    let (columns, searchable, restrict_path) = match entity_type {
        EntityType::Investigation => (
            vec![
                text("title"),
                text("name"),
                text("visitId"),
                text("doi"),
                date("startDate"),
                date("endDate"),
            ],
            vec!["title", "name", "summary"],
            Some("investigationUsers.user.name"),
        ),
        EntityType::Dataset => (
            vec![
                text("name"),
                text("description"),
                date("createTime"),
                date("modTime"),
            ],
            vec!["name", "description"],
            Some("investigation.investigationUsers.user.name"),
        ),
        EntityType::Datafile => (
            vec![
                text("name"),
                text("location"),
                number("fileSize"),
                date("createTime"),
                date("modTime"),
            ],
            vec!["name", "location", "description"],
            Some("dataset.investigation.investigationUsers.user.name"),
        ),
        EntityType::Instrument => (
            vec![text("name"), text("fullName"), text("type"), text("url")],
            vec!["name", "fullName", "description"],
            None,
        ),
        EntityType::FacilityCycle => (
            vec![
                text("name"),
                text("description"),
                date("startDate"),
                date("endDate"),
            ],
            vec!["name", "description"],
            None,
        ),
        EntityType::Study => (
            vec![
                text("name"),
                text("pid"),
                text("description"),
                date("startDate"),
                date("endDate"),
            ],
            vec!["name", "description"],
            Some("studyInvestigations.investigation.investigationUsers.user.name"),
        ),
        EntityType::DataPublication => (
            vec![text("title"), text("pid"), date("publicationDate")],
            vec!["title", "description"],
            None,
        ),
    };

    EntityCapabilities {
        entity_type,
        hierarchy: Hierarchy::Generic,
        columns,
        searchable,
        restrict_path,
        include: vec![],
    }
}
