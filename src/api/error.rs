//! Tipos de erro para o cliente da API de relatórios.
//!
//! Define [`ApiError`] com variantes para autenticação, recursos ausentes,
//! erros HTTP genéricos e erros de rede. Usa `thiserror` para derivar
//! `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao consultar o backend.
///
/// - [`Unauthorized`](ApiError::Unauthorized): HTTP 401, token ausente ou expirado
/// - [`Forbidden`](ApiError::Forbidden): HTTP 403, ex.: sem créditos de relatório
/// - [`NotFound`](ApiError::NotFound): HTTP 404, job ou sessão inexistente
/// - [`ApiError`](ApiError::ApiError): qualquer outro erro HTTP (4xx/5xx)
/// - [`InvalidBaseUrl`](ApiError::InvalidBaseUrl): URL base inutilizável
/// - [`NetworkError`](ApiError::NetworkError): falha na camada de rede ou decodificação
#[derive(Debug, Error)]
pub enum ApiError {
    /// O servidor recusou o token (HTTP 401).
    #[error("unauthorized (check the API token)")]
    Unauthorized,

    /// O servidor recusou a operação (HTTP 403). Contém o `detail` retornado.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// O recurso consultado não existe (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Qualquer outro status não-2xx, com o código e a mensagem do corpo.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A URL base configurada não pode receber segmentos de caminho.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout, JSON inválido).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl ApiError {
    /// Constrói o erro adequado a partir do status HTTP e do corpo da resposta.
    ///
    /// Corpos no formato FastAPI (`{"detail": "..."}`) são desembrulhados.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_detail(body);
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::ApiError { status, message },
        }
    }
}

fn extract_detail(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Detail {
        detail: String,
    }

    match serde_json::from_str::<Detail>(body) {
        Ok(d) => d.detail,
        Err(_) if body.trim().is_empty() => "unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
