//! 配置解析
//!
//! 两种格式都先解析为 `toml::Value` 树，分层文件合并之后再做强类型反序列化。

use contracts::{ContractError, NodeConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 为无类型树
pub fn parse_toml(content: &str) -> Result<toml::Value, ContractError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })?;
    Ok(toml::Value::Table(table))
}

/// 解析 JSON 为无类型树
///
/// TOML 没有 `null`，遇到时报错。
pub fn parse_json(content: &str) -> Result<toml::Value, ContractError> {
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("JSON parse error: {e}"),
            source: Some(Box::new(e)),
        })?;
    if !json.is_object() {
        return Err(ContractError::config_parse(
            "JSON config must be an object at the top level",
        ));
    }
    toml::Value::try_from(json).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON value not representable: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析
pub fn parse_value(content: &str, format: ConfigFormat) -> Result<toml::Value, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 将合并后的树反序列化为 NodeConfig
pub fn into_config(value: toml::Value) -> Result<NodeConfig, ContractError> {
    value
        .try_into()
        .map_err(|e: toml::de::Error| ContractError::ConfigParse {
            message: format!("config schema error: {e}"),
            source: Some(Box::new(e)),
        })
}
