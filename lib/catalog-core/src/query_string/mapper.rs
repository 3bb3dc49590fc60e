use super::dto::{
    DateRangeDTO, FilterValueDTO, NumberRangeDTO, TextFilterDTO, TextFilterTypeDTO,
};
use crate::model::list_filter::{FilterValue, TextFilter, TextMatchType};

impl From<TextFilterTypeDTO> for TextMatchType {
    fn from(value: TextFilterTypeDTO) -> Self {
        match value {
            TextFilterTypeDTO::Include => Self::Include,
            TextFilterTypeDTO::Exclude => Self::Exclude,
            TextFilterTypeDTO::Exact => Self::Exact,
        }
    }
}

impl From<TextMatchType> for TextFilterTypeDTO {
    fn from(value: TextMatchType) -> Self {
        match value {
            TextMatchType::Include => Self::Include,
            TextMatchType::Exclude => Self::Exclude,
            TextMatchType::Exact => Self::Exact,
        }
    }
}

impl From<FilterValueDTO> for FilterValue {
    fn from(value: FilterValueDTO) -> Self {
        match value {
            FilterValueDTO::Text(TextFilterDTO { r#type, value }) => Self::Text(TextFilter {
                r#match: r#type.into(),
                value,
            }),
            FilterValueDTO::DateRange(DateRangeDTO {
                start_date,
                end_date,
            }) => Self::DateRange {
                from: start_date,
                to: end_date,
            },
            FilterValueDTO::NumberRange(NumberRangeDTO { min, max }) => {
                Self::NumberRange { min, max }
            }
            FilterValueDTO::OneOf(values) => Self::OneOf(values),
        }
    }
}

impl From<&FilterValue> for FilterValueDTO {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(filter) => Self::Text(TextFilterDTO {
                r#type: filter.r#match.into(),
                value: filter.value.clone(),
            }),
            FilterValue::DateRange { from, to } => Self::DateRange(DateRangeDTO {
                start_date: *from,
                end_date: *to,
            }),
            FilterValue::NumberRange { min, max } => Self::NumberRange(NumberRangeDTO {
                min: *min,
                max: *max,
            }),
            FilterValue::OneOf(values) => Self::OneOf(values.clone()),
        }
    }
}
