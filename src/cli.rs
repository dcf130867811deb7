//! Interface de linha de comando do reportsync baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (analyze, track,
//! refresh, download, payment, me, dashboard) e flags globais (--config, --base-url,
//! --token, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// reportsync: acompanha relatórios de análise e reconcilia pagamentos.
#[derive(Debug, Parser)]
#[command(name = "reportsync", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho alternativo para o arquivo de configuração.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// URL base do backend (sobrescreve arquivo e ambiente).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Token de acesso (sobrescreve arquivo e ambiente).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solicita a geração de um relatório e acompanha até terminar.
    Analyze {
        /// Identificador da propriedade enviada.
        property_id: String,
    },

    /// Acompanha um job de análise já existente.
    Track {
        /// Identificador da análise.
        analysis_id: String,
    },

    /// Consulta o status de uma análise uma única vez.
    Refresh {
        /// Identificador da análise.
        analysis_id: String,
    },

    /// Baixa o PDF de uma análise concluída.
    Download {
        /// Identificador da análise.
        analysis_id: String,

        /// Arquivo de destino (padrão: `<analysis_id>.pdf`).
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Confirma um pagamento e reconcilia o saldo de relatórios.
    Payment {
        /// Identificador da sessão de checkout.
        session_id: String,
    },

    /// Mostra o usuário atual e o saldo de relatórios.
    Me,

    /// Lista as análises e o saldo (verificação manual).
    Dashboard,
}
