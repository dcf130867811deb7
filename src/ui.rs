//! Interface de terminal do reportsync: spinners e saída colorida.
//!
//! Usa `indicatif` para o spinner de progresso e `console` para cores.
//! O [`PollProgress`] acompanha visualmente uma sessão de polling.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use reportsync::api::{AnalysisRecord, UserSnapshot};
use reportsync::poller::Outcome;

/// Indicador visual de uma sessão de polling no terminal.
///
/// Exibe um spinner enquanto o job está pendente e mensagens coloridas
/// para sucesso (verde), falha (vermelho) e tempo esgotado (amarelo).
pub struct PollProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl PollProgress {
    /// Inicia o spinner com o rótulo da operação.
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(label.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza o spinner com o último status observado.
    pub fn update(&self, label: &str, status: &str, attempts_made: u32) {
        self.pb
            .set_message(format!("{label}: {status} (check #{attempts_made})"));
    }

    /// Finaliza o spinner e exibe o resultado.
    ///
    /// `success` formata o payload; `hint` orienta a verificação manual
    /// quando o tempo se esgota ou o job falha.
    pub fn finish<P>(&self, outcome: &Outcome<P>, success: impl FnOnce(&P) -> String, hint: &str) {
        self.pb.finish_and_clear();
        match outcome {
            Outcome::Succeeded { payload } => {
                println!("  {} {}", self.green.apply_to("✓"), success(payload));
            }
            Outcome::Failed { reason } => {
                println!("  {} {reason}", self.red.apply_to("✗"));
                println!("    {hint}");
            }
            Outcome::TimedOut {
                attempts_made,
                elapsed_ms,
            } => {
                println!(
                    "  {} {}",
                    self.yellow.apply_to("…"),
                    timeout_message(*attempts_made, *elapsed_ms, hint)
                );
            }
        }
    }

    /// Finaliza o spinner após cancelamento pelo usuário.
    pub fn cancelled(&self) {
        self.pb.finish_and_clear();
        println!("  {} Cancelled; nothing more will be checked.", self.yellow.apply_to("↺"));
    }
}

/// Mensagem de "volte mais tarde" exibida quando o orçamento se esgota.
pub fn timeout_message(attempts_made: u32, elapsed_ms: u64, hint: &str) -> String {
    let secs = elapsed_ms / 1000;
    format!("Still in progress after {attempts_made} checks ({secs}s). {hint}")
}

/// Imprime o snapshot do usuário.
pub fn print_snapshot(user: &UserSnapshot) {
    let bold = Style::new().bold();
    println!("{} <{}>", bold.apply_to(&user.name), user.email);
    println!("  Reports available: {}", user.available_reports);
}

/// Imprime a lista de análises do painel.
pub fn print_analyses(records: &[AnalysisRecord]) {
    if records.is_empty() {
        println!("  No analyses yet.");
        return;
    }
    let dim = Style::new().dim();
    for record in records {
        println!(
            "  {:<12} {}  {}",
            record.status.to_string(),
            record.property_name,
            dim.apply_to(&record.id)
        );
    }
}
