use super::AppConfig;
use crate::utils::error::{IngestError, Result};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，缺少的段落使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content, |name| std::env::var(name).ok());

        toml::from_str(&processed).map_err(|e| IngestError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// 替換環境變數 (例如 ${OLLAMA_URL})；未設定的變數保持原樣
fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkKind;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[model]
model = "llava"

[sink]
kind = "csv"
csv_path = "./out/profiles.csv"
"#,
        )
        .unwrap();

        assert_eq!(config.model.model, "llava");
        assert_eq!(config.model.max_output_tokens, 700);
        assert_eq!(config.sink.kind, SinkKind::Csv);
        assert_eq!(config.sink.csv_path, "./out/profiles.csv");
        assert_eq!(config.server.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let out = substitute_env_vars("endpoint = \"${SHEETS}\" other = \"${UNSET}\"", |name| {
            (name == "SHEETS").then(|| "http://sheets:9000".to_string())
        });
        assert_eq!(out, "endpoint = \"http://sheets:9000\" other = \"${UNSET}\"");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml_str("[model\nendpoint = ").unwrap_err();
        assert!(matches!(err, IngestError::ConfigError { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_addr = \"127.0.0.1:9100\"").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9100");
    }
}
