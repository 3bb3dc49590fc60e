use std::path::Path;
use std::time::Duration;

use figment::Figment;
#[cfg(feature = "config_env")]
use figment::providers::Env;
#[cfg(feature = "config_json")]
use figment::providers::Json;
#[cfg(feature = "config_yaml")]
use figment::providers::Yaml;
use figment::providers::{Data, Format};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use url::Url;

use super::{ConfigParsingError, ConfigValidationError};
use crate::filter_compiler::capabilities::Hierarchy;
use crate::model::query_state::{DEFAULT_PAGE_SIZES, PageSizes};
use crate::service::debounce::DEFAULT_QUIET_PERIOD;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoCustomConfig;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppCustomConfigSerdeDTO<Custom> {
    #[serde(default)]
    pub(super) app: Custom,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig<Custom> {
    pub core: CoreConfig,
    #[serde(default)]
    pub app: Custom,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreConfig {
    pub api_url: Url,
    #[serde(default)]
    pub facility: Hierarchy,
    #[serde(default = "default_page_sizes")]
    pub page_sizes: Vec<u32>,
    /// quiet period of text inputs
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_debounce")]
    pub debounce: Duration,
    #[serde(default = "default_lookahead_pages")]
    pub lookahead_pages: u32,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    #[serde(default)]
    pub request_timeout: Option<Duration>,
    /// principal matched by "my data" restrictions
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub session_token: Option<SecretString>,
}

fn default_page_sizes() -> Vec<u32> {
    DEFAULT_PAGE_SIZES.to_vec()
}

fn default_debounce() -> Duration {
    DEFAULT_QUIET_PERIOD
}

fn default_lookahead_pages() -> u32 {
    1
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        match self.api_url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigValidationError::UnsupportedScheme(other.to_owned())),
        }

        if self.lookahead_pages == 0 {
            return Err(ConfigValidationError::ZeroLookahead);
        }

        self.page_sizes().map(|_| ())
    }

    pub fn page_sizes(&self) -> Result<PageSizes, ConfigValidationError> {
        PageSizes::new(self.page_sizes.iter().copied())
            .ok_or(ConfigValidationError::EmptyPageSizes)
    }
}

pub enum InputFormat {
    #[cfg(feature = "config_yaml")]
    Yaml(Data<Yaml>),
    #[cfg(feature = "config_json")]
    Json(Data<Json>),
}

impl InputFormat {
    #[cfg(feature = "config_yaml")]
    pub fn yaml_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Yaml(Yaml::file(p))
    }

    #[cfg(feature = "config_yaml")]
    pub fn yaml_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Yaml(Yaml::string(s.as_ref()))
    }

    #[cfg(feature = "config_json")]
    pub fn json_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Json(Json::file(p))
    }

    #[cfg(feature = "config_json")]
    pub fn json_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Json(Json::string(s.as_ref()))
    }
}

impl<Custom> AppConfig<Custom>
where
    Custom: Serialize + DeserializeOwned + Default,
{
    pub fn from_files(files: &[impl AsRef<Path>]) -> Result<Self, ConfigParsingError> {
        let mut inputs: Vec<InputFormat> = Vec::with_capacity(files.len());

        for path in files {
            #[cfg(feature = "config_yaml")]
            if path
                .as_ref()
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
            {
                inputs.push(InputFormat::yaml_file(path));
                continue;
            }

            #[cfg(feature = "config_json")]
            if path.as_ref().extension() == Some("json".as_ref()) {
                inputs.push(InputFormat::json_file(path));
                continue;
            }

            return Err(ConfigParsingError::GeneralParsingError(format!(
                "Unsupported file or missing file extension: {:?}",
                path.as_ref().to_str()
            )));
        }

        AppConfig::parse(inputs)
    }

    #[cfg(feature = "config_yaml")]
    pub fn from_yaml(
        configs: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ConfigParsingError> {
        let inputs = configs.into_iter().map(InputFormat::yaml_str);

        AppConfig::parse(inputs)
    }

    /// Later inputs override earlier ones; environment variables prefixed
    /// with `CATALOG_` override all files.
    pub fn parse(
        inputs: impl IntoIterator<Item = InputFormat>,
    ) -> Result<Self, ConfigParsingError> {
        let mut figment = Figment::new();

        for data in inputs {
            figment = match data {
                #[cfg(feature = "config_yaml")]
                InputFormat::Yaml(content) => figment.merge(content),
                #[cfg(feature = "config_json")]
                InputFormat::Json(content) => figment.merge(content),
            };
        }

        #[cfg(feature = "config_env")]
        {
            figment = figment.merge(Env::prefixed("CATALOG_").split("__").lowercase(false));
        }

        let core = figment
            .extract::<CoreConfig>()
            .map_err(|e| ConfigParsingError::GeneralParsingError(e.to_string()))?;
        let custom = figment
            .extract::<AppCustomConfigSerdeDTO<Custom>>()
            .map_err(|e| ConfigParsingError::GeneralParsingError(e.to_string()))?;
        Ok(Self {
            core,
            app: custom.app,
        })
    }
}
