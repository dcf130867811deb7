//! Configuração do reportsync carregada a partir de `reportsync.toml`.
//!
//! A struct [`ReportSyncConfig`] contém o endereço do backend, o token e
//! ajustes opcionais de tempo para cada política de reconciliação.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `REPORTSYNC_TOKEN` e `REPORTSYNC_BASE_URL` têm
//! precedência sobre o arquivo.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::api::ApiClient;
use crate::error::{ReconcileError, Result};
use crate::poller::PollOptions;
use crate::reconcile::{AnalysisReconciliation, PaymentReconciliation, ReconciliationPolicy};

pub const CONFIG_FILE: &str = "reportsync.toml";

/// Configuração de nível superior carregada de `reportsync.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSyncConfig {
    /// URL base do backend, incluindo o prefixo `/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Token JWT enviado como `Authorization: Bearer`.
    #[serde(default)]
    pub api_token: String,

    /// Timeout de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Ajustes da política de análise (`[analysis]`).
    #[serde(default)]
    pub analysis: PolicyOverrides,

    /// Ajustes da política de pagamento (`[payment]`).
    #[serde(default)]
    pub payment: PolicyOverrides,
}

/// Sobrescritas opcionais aplicadas sobre os defaults de uma política.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PolicyOverrides {
    pub interval_ms: Option<u64>,
    pub attempt_budget: Option<u32>,
    pub time_budget_ms: Option<u64>,
}

impl PolicyOverrides {
    /// Aplica as sobrescritas presentes; campos ausentes mantêm o valor base.
    pub fn apply(&self, mut options: PollOptions) -> PollOptions {
        if let Some(ms) = self.interval_ms {
            options.interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = self.attempt_budget {
            options.attempt_budget = Some(attempts);
        }
        if let Some(ms) = self.time_budget_ms {
            options.time_budget = Some(Duration::from_millis(ms));
        }
        options
    }
}

// Valor padrão para a URL base: backend local.
fn default_base_url() -> String {
    "http://localhost:8001/api".to_string()
}

// Valor padrão para o timeout de requisição: 30s.
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ReportSyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            analysis: PolicyOverrides::default(),
            payment: PolicyOverrides::default(),
        }
    }
}

impl ReportSyncConfig {
    /// Carrega a configuração de `reportsync.toml` no diretório atual.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração do caminho informado.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<ReportSyncConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
        config.apply_overrides(
            std::env::var("REPORTSYNC_TOKEN").ok(),
            std::env::var("REPORTSYNC_BASE_URL").ok(),
        );

        Ok(config)
    }

    /// Sobrescreve token e URL base quando os valores fornecidos não são vazios.
    pub fn apply_overrides(&mut self, token: Option<String>, base_url: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.api_token = token;
        }
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
    }

    /// Constrói o cliente HTTP. Rejeita URLs base que não sejam http(s).
    pub fn api_client(&self) -> Result<ApiClient> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ReconcileError::Config(format!(
                "base_url must be an http(s) URL, got `{}`",
                self.base_url
            )));
        }
        Ok(ApiClient::with_base_url(
            Some(self.api_token.clone()),
            self.base_url.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )?)
    }

    pub fn analysis_policy(&self) -> Result<AnalysisReconciliation> {
        let base = AnalysisReconciliation::default().options().clone();
        AnalysisReconciliation::with_options(self.analysis.apply(base))
    }

    pub fn payment_policy(&self) -> Result<PaymentReconciliation> {
        let base = PaymentReconciliation::default().options().clone();
        PaymentReconciliation::with_options(self.payment.apply(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ReportSyncConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001/api");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.api_token.is_empty());
        assert_eq!(config.analysis, PolicyOverrides::default());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_token = "jwt-test-123"

            [payment]
            attempt_budget = 8
        "#;
        let config: ReportSyncConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_token, "jwt-test-123");
        assert_eq!(config.payment.attempt_budget, Some(8));
        assert_eq!(config.payment.interval_ms, None);
        assert_eq!(config.base_url, "http://localhost:8001/api");
    }

    #[test]
    fn policies_keep_defaults_without_overrides() {
        let config = ReportSyncConfig::default();
        let analysis = config.analysis_policy().unwrap();
        assert_eq!(analysis.options().interval, Duration::from_secs(3));
        assert_eq!(analysis.options().time_budget, Some(Duration::from_secs(120)));

        let payment = config.payment_policy().unwrap();
        assert_eq!(payment.options().interval, Duration::from_secs(2));
        assert_eq!(payment.options().attempt_budget, Some(5));
    }

    #[test]
    fn overrides_apply_on_top_of_policy_defaults() {
        let mut config = ReportSyncConfig::default();
        config.analysis.interval_ms = Some(5_000);
        config.payment.time_budget_ms = Some(30_000);

        let analysis = config.analysis_policy().unwrap();
        assert_eq!(analysis.options().interval, Duration::from_secs(5));
        assert_eq!(analysis.options().time_budget, Some(Duration::from_secs(120)));

        let payment = config.payment_policy().unwrap();
        assert_eq!(payment.options().attempt_budget, Some(5));
        assert_eq!(payment.options().time_budget, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_interval_override_is_rejected() {
        let mut config = ReportSyncConfig::default();
        config.payment.interval_ms = Some(0);
        assert!(matches!(
            config.payment_policy().unwrap_err(),
            ReconcileError::InvalidOptions(_)
        ));
    }

    #[test]
    fn apply_overrides_ignores_empty_values() {
        let mut config = ReportSyncConfig::default();
        config.apply_overrides(Some(String::new()), Some("http://staging.test/api".into()));
        assert!(config.api_token.is_empty());
        assert_eq!(config.base_url, "http://staging.test/api");

        config.apply_overrides(Some("tok".into()), None);
        assert_eq!(config.api_token, "tok");
        assert_eq!(config.base_url, "http://staging.test/api");
    }

    #[test]
    fn api_client_rejects_non_http_base_url() {
        let mut config = ReportSyncConfig::default();
        config.base_url = "localhost:8001/api".into();
        assert!(matches!(config.api_client(), Err(ReconcileError::Config(_))));

        config.base_url = "https://reports.example.com/api".into();
        assert_eq!(
            config.api_client().unwrap().base_url(),
            "https://reports.example.com/api"
        );
    }

    #[test]
    fn load_from_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "request_timeout_secs = 5\n[analysis]\ntime_budget_ms = 60000\n",
        )
        .unwrap();

        let config = ReportSyncConfig::load_from(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.analysis.time_budget_ms, Some(60_000));
    }

    #[test]
    fn load_from_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ReportSyncConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn load_from_rejects_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "request_timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            ReportSyncConfig::load_from(&path).unwrap_err(),
            ReconcileError::Toml(_)
        ));
    }
}
