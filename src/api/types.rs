//! Tipos de dados trocados com o backend de relatórios.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` no formato JSON
//! servido sob o prefixo `/api`. Status desconhecidos são aceitos e
//! mapeados para uma variante `Unknown`, tratada como não-terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status de um job de geração de análise.
///
/// O backend grava `pending` ao criar o registro; `queued` é aceito como sinônimo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[serde(alias = "pending")]
    Queued,
    Generating,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnalysisStatus::Queued => "queued",
            AnalysisStatus::Generating => "generating",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Registro de análise retornado por `GET /analysis/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Identificador do job, atribuído pelo backend.
    pub id: String,
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub property_name: String,
    pub status: AnalysisStatus,
    /// Resultado da análise; vazio até o job terminar.
    #[serde(default)]
    pub analysis_data: serde_json::Value,
    #[serde(default)]
    pub pdf_path: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Resposta de `POST /analysis/generate/{property_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedAnalysis {
    pub analysis_id: String,
    pub status: AnalysisStatus,
}

/// Status da sessão de checkout (lado do provedor de pagamento).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    Open,
    Complete,
    Expired,
    #[serde(other)]
    Unknown,
}

/// Status do pagamento associado à sessão de checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Unpaid,
    Paid,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Pending => "pending",
            PaymentState::Unpaid => "unpaid",
            PaymentState::Paid => "paid",
            PaymentState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Resposta de `GET /payments/status/{session_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(default)]
    pub status: Option<CheckoutStatus>,
    pub payment_status: PaymentState,
    /// Presente apenas quando o backend já creditou os relatórios.
    #[serde(default)]
    pub reports_credited: Option<u32>,
}

/// Snapshot do usuário autenticado, retornado por `GET /auth/me`.
///
/// É sempre substituído por inteiro; nunca é corrigido localmente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Saldo com sinal: gerações concorrentes podem deixá-lo negativo no servidor.
    #[serde(default)]
    pub available_reports: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
