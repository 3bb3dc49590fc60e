use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[cfg(test)]
mod test;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EntityType {
    Investigation,
    Dataset,
    Datafile,
    Instrument,
    FacilityCycle,
    Study,
    DataPublication,
}

impl EntityType {
    /// Collection path of the entity on the catalog API, e.g. `studies`
    pub fn endpoint(&self) -> String {
        let name = self.to_string();
        match name.strip_suffix('y') {
            Some(stem) => format!("{stem}ies"),
            None => format!("{name}s"),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EntityId(u64);

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<EntityId> for u64 {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog record: the fields shared by every entity plus the
/// type-specific extension.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub details: EntityDetails,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityDetails {
    Investigation(InvestigationDetails),
    Dataset(DatasetDetails),
    Datafile(DatafileDetails),
    Instrument(InstrumentDetails),
    FacilityCycle(FacilityCycleDetails),
    Study(StudyDetails),
    DataPublication(DataPublicationDetails),
}

impl EntityDetails {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Investigation(_) => EntityType::Investigation,
            Self::Dataset(_) => EntityType::Dataset,
            Self::Datafile(_) => EntityType::Datafile,
            Self::Instrument(_) => EntityType::Instrument,
            Self::FacilityCycle(_) => EntityType::FacilityCycle,
            Self::Study(_) => EntityType::Study,
            Self::DataPublication(_) => EntityType::DataPublication,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedReference {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationDetails {
    pub title: Option<String>,
    pub visit_id: Option<String>,
    pub doi: Option<String>,
    pub summary: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub investigation_instruments: Vec<InvestigationInstrument>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationInstrument {
    pub id: EntityId,
    pub instrument: Option<NamedReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDetails {
    pub description: Option<String>,
    pub create_time: Option<String>,
    pub mod_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub dataset_type: Option<NamedReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatafileDetails {
    pub description: Option<String>,
    pub location: Option<String>,
    pub file_size: Option<u64>,
    pub create_time: Option<String>,
    pub mod_time: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDetails {
    pub full_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub instrument_type: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityCycleDetails {
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDetails {
    #[serde(rename = "PID")]
    pub pid: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPublicationDetails {
    pub title: Option<String>,
    pub pid: Option<String>,
    pub description: Option<String>,
    pub publication_date: Option<String>,
}

#[derive(Deserialize)]
struct EntityBase {
    id: EntityId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl EntityRecord {
    /// Decodes a raw API record of the given type. Records without a `name`
    /// (data publications) fall back to their `title`.
    pub fn from_json(
        entity_type: EntityType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let base = EntityBase::deserialize(&value)?;

        let details = match entity_type {
            EntityType::Investigation => {
                EntityDetails::Investigation(InvestigationDetails::deserialize(&value)?)
            }
            EntityType::Dataset => EntityDetails::Dataset(DatasetDetails::deserialize(&value)?),
            EntityType::Datafile => EntityDetails::Datafile(DatafileDetails::deserialize(&value)?),
            EntityType::Instrument => {
                EntityDetails::Instrument(InstrumentDetails::deserialize(&value)?)
            }
            EntityType::FacilityCycle => {
                EntityDetails::FacilityCycle(FacilityCycleDetails::deserialize(&value)?)
            }
            EntityType::Study => EntityDetails::Study(StudyDetails::deserialize(&value)?),
            EntityType::DataPublication => {
                EntityDetails::DataPublication(DataPublicationDetails::deserialize(&value)?)
            }
        };

        Ok(Self {
            id: base.id,
            name: base.name.or(base.title).unwrap_or_default(),
            details,
        })
    }

    pub fn entity_type(&self) -> EntityType {
        self.details.entity_type()
    }
}
