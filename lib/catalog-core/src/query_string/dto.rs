use serde::{Deserialize, Serialize};
use time::Date;

use crate::model::list_filter::ListItem;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub(super) enum FilterValueDTO {
    /// first, as the struct variants would also accept a JSON array
    OneOf(Vec<ListItem>),
    Text(TextFilterDTO),
    DateRange(DateRangeDTO),
    NumberRange(NumberRangeDTO),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(super) struct TextFilterDTO {
    pub r#type: TextFilterTypeDTO,
    pub value: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum TextFilterTypeDTO {
    #[serde(alias = "text")]
    Include,
    Exclude,
    Exact,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(super) struct DateRangeDTO {
    #[serde(default, with = "date_format::option", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    #[serde(default, with = "date_format::option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(super) struct NumberRangeDTO {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}
